use serde::{Deserialize, Serialize};

/// One presented item: its position in the block, the compared symbol and any
/// task-specific presentation attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus<S, C = ()> {
    pub index: usize,
    pub symbol: S,
    pub context: C,
}

impl<S> Stimulus<S> {
    pub fn new(index: usize, symbol: S) -> Self {
        Self {
            index,
            symbol,
            context: (),
        }
    }
}

impl<S, C> Stimulus<S, C> {
    pub fn with_context(index: usize, symbol: S, context: C) -> Self {
        Self {
            index,
            symbol,
            context,
        }
    }
}
