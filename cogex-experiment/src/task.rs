use cogex_core::{BlockSummary, ConfigError, Key, Screen, Stimulus, TrialRecord};
use rand::Rng;
use std::fmt;

use crate::config::BlockTiming;

/// What differs between the n-back and Stroop tasks. Everything else (timing,
/// scoring, block and session flow) is shared.
pub trait Task: Sized {
    type Symbol: Copy + PartialEq + fmt::Debug + fmt::Display;
    type Context: Copy + fmt::Debug;
    type Answer: Copy + Eq + fmt::Debug + fmt::Display;

    /// Short name used in logs and result file names.
    fn name(&self) -> &'static str;

    fn timing(&self) -> &BlockTiming;

    /// Fails fast on parameters the task cannot run with.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Keys that count as answers.
    fn response_keys(&self) -> &[Key];

    /// Total mapping from response keys to answers; `None` for anything else.
    fn interpret(&self, key: Key) -> Option<Self::Answer>;

    /// The correct answer, from the stimulus and the stimuli shown before it.
    fn ground_truth(&self, stimulus: &StimulusOf<Self>, history: &[StimulusOf<Self>])
        -> Self::Answer;

    /// A block of `length` stimuli, fixed before the first one is shown.
    fn generate<R: Rng + ?Sized>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<StimulusOf<Self>>, ConfigError>;

    fn screen(&self, stimulus: &StimulusOf<Self>) -> Screen;

    /// Result-file columns describing a stimulus.
    fn stimulus_columns(&self) -> &'static [&'static str] {
        &["stimulus"]
    }

    /// One value per [`Task::stimulus_columns`] entry.
    fn stimulus_values(&self, stimulus: &StimulusOf<Self>) -> Vec<String> {
        vec![stimulus.symbol.to_string()]
    }

    /// Instruction pages shown before practice, each acknowledged with Space.
    fn instructions(&self) -> Vec<String>;
}

pub type StimulusOf<T> = Stimulus<<T as Task>::Symbol, <T as Task>::Context>;
pub type RecordOf<T> = TrialRecord<StimulusOf<T>, <T as Task>::Answer>;
pub type SummaryOf<T> = BlockSummary<StimulusOf<T>, <T as Task>::Answer>;
