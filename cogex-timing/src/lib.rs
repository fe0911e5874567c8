pub mod clock;
pub mod keys;
pub mod timer;

pub use clock::TrialClock;
pub use keys::KeySource;
pub use timer::{HighPrecisionTimer, Timer};
