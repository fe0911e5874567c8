use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A key as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Space,
    /// Global abort.
    Escape,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Space => f.write_str("space"),
            Key::Escape => f.write_str("escape"),
        }
    }
}

/// Outcome of one response window. `key == None` means the window expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub key: Option<Key>,
    pub latency: Option<Duration>,
}

impl ResponseEvent {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pressed(key: Key, latency: Duration) -> Self {
        Self {
            key: Some(key),
            latency: Some(latency),
        }
    }

    pub fn is_none(&self) -> bool {
        self.key.is_none()
    }
}
