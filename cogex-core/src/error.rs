use thiserror::Error;

/// Invalid task parameters. Raised before anything is generated or shown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("lag must be at least 1")]
    ZeroLag,
    #[error("sequence length {length} must exceed lag {lag}")]
    LengthNotAboveLag { length: usize, lag: usize },
    #[error("match probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("response window must be longer than zero")]
    ZeroResponseWindow,
    #[error("a block needs at least one trial")]
    EmptyBlock,
}

/// Control signals that end the running block and the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error("cancelled by participant")]
    Cancelled,
    #[error("input source closed")]
    InputClosed,
}
