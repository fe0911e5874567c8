pub mod config;
pub mod export;
pub mod nback;
pub mod presenter;
pub mod runner;
pub mod scorer;
pub mod sequence;
pub mod session;
pub mod stroop;
pub mod task;

pub use config::{BlockTiming, ExperimentConfig, NBackConfig, OutputConfig, StroopConfig};
pub use export::{ExportError, ResultFormat, ResultRow};
pub use nback::{NBackAnswer, NBackTask};
pub use presenter::Presenter;
pub use runner::{BlockRunner, BlockSettings, BlockState};
pub use scorer::score;
pub use sequence::{generate_sequence, SequenceStats};
pub use session::{SessionController, SessionReport, SessionStatus};
pub use stroop::StroopTask;
pub use task::{RecordOf, StimulusOf, SummaryOf, Task};
