pub mod error;
pub mod phase;
pub mod response;
pub mod screen;
pub mod stimulus;
pub mod symbol;
pub mod trial;

pub use error::{ConfigError, Interrupt};
pub use phase::Phase;
pub use response::{Key, ResponseEvent};
pub use screen::{Rgba, Screen, BLACK, WHITE};
pub use stimulus::Stimulus;
pub use symbol::{Background, Digit, InkColor, StroopPair, Symbol};
pub use trial::{BlockEnd, BlockSummary, TrialRecord};
