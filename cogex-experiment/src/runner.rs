use cogex_core::{BlockEnd, BlockSummary, Interrupt, Key, ResponseEvent, Screen};
use cogex_timing::{KeySource, Timer, TrialClock};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::BlockTiming;
use crate::presenter::Presenter;
use crate::scorer::score;
use crate::task::{StimulusOf, SummaryOf, Task};

/// Per-trial states of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Ready,
    Present,
    AwaitResponse,
    Score,
    InterStimulusGap,
    Done(BlockEnd),
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSettings {
    /// Practice blocks show feedback after every trial.
    pub practice: bool,
    pub response_window: Option<Duration>,
    pub inter_stimulus_gap: Duration,
    /// Measured from the start of the block, checked between trials only.
    pub deadline: Option<Duration>,
}

impl BlockSettings {
    pub fn practice(timing: &BlockTiming) -> Self {
        Self {
            practice: true,
            response_window: timing.practice_response_window(),
            inter_stimulus_gap: timing.inter_stimulus_gap(),
            deadline: None,
        }
    }

    pub fn timed(timing: &BlockTiming, deadline: Option<Duration>) -> Self {
        Self {
            practice: false,
            response_window: Some(timing.response_window()),
            inter_stimulus_gap: timing.inter_stimulus_gap(),
            deadline,
        }
    }
}

/// Drives one block of pre-generated stimuli through present, respond and score.
pub struct BlockRunner<'a, T, P: ?Sized, K: ?Sized, C: ?Sized> {
    task: &'a T,
    presenter: &'a mut P,
    keys: &'a mut K,
    timer: &'a C,
    settings: BlockSettings,
}

struct Progress<T: Task> {
    started: u64,
    cursor: usize,
    response: ResponseEvent,
    summary: SummaryOf<T>,
}

impl<'a, T, P, K, C> BlockRunner<'a, T, P, K, C>
where
    T: Task,
    P: Presenter + ?Sized,
    K: KeySource + ?Sized,
    C: Timer + ?Sized,
{
    pub fn new(
        task: &'a T,
        presenter: &'a mut P,
        keys: &'a mut K,
        timer: &'a C,
        settings: BlockSettings,
    ) -> Self {
        Self {
            task,
            presenter,
            keys,
            timer,
            settings,
        }
    }

    /// Runs until the sequence is used up, the deadline passes or the participant aborts.
    ///
    /// Every presented stimulus yields exactly one record; a trial interrupted by
    /// an abort is recorded as unanswered.
    pub fn run(&mut self, sequence: &[StimulusOf<T>]) -> SummaryOf<T> {
        let mut progress = Progress::<T> {
            started: self.timer.now(),
            cursor: 0,
            response: ResponseEvent::none(),
            summary: BlockSummary::new(),
        };
        info!(
            task = self.task.name(),
            practice = self.settings.practice,
            stimuli = sequence.len(),
            deadline = ?self.settings.deadline,
            "block started"
        );

        let mut state = BlockState::Ready;
        let end = loop {
            state = self.step(state, sequence, &mut progress);
            trace!(?state, cursor = progress.cursor, "block state");
            match state {
                BlockState::Done(end) => break end,
                BlockState::Aborted => break BlockEnd::Aborted,
                _ => {}
            }
        };

        let mut summary = progress.summary;
        summary.end = end;
        info!(
            task = self.task.name(),
            ?end,
            total = summary.total_trials,
            correct = summary.correct_trials,
            "block finished"
        );
        summary
    }

    fn step(
        &mut self,
        state: BlockState,
        sequence: &[StimulusOf<T>],
        progress: &mut Progress<T>,
    ) -> BlockState {
        match state {
            BlockState::Ready => {
                if progress.cursor >= sequence.len() {
                    BlockState::Done(BlockEnd::Exhausted)
                } else if self.deadline_passed(progress.started) {
                    BlockState::Done(BlockEnd::DeadlineReached)
                } else {
                    BlockState::Present
                }
            }
            BlockState::Present => {
                let stimulus = &sequence[progress.cursor];
                debug!(
                    index = stimulus.index,
                    symbol = %stimulus.symbol,
                    at_ns = self.timer.now(),
                    "stimulus presented"
                );
                self.presenter.present(self.task.screen(stimulus));
                BlockState::AwaitResponse
            }
            BlockState::AwaitResponse => {
                let window = self.settings.response_window;
                let outcome = TrialClock::new(&mut *self.keys, self.timer)
                    .await_response(window, self.task.response_keys());
                match outcome {
                    Ok(response) => {
                        progress.response = response;
                        BlockState::Score
                    }
                    Err(interrupt) => {
                        warn!(%interrupt, index = progress.cursor, "block interrupted");
                        self.record(sequence, progress, ResponseEvent::none());
                        BlockState::Aborted
                    }
                }
            }
            BlockState::Score => {
                let response = progress.response;
                let (correct, latency) = self.record(sequence, progress, response);
                if self.settings.practice {
                    if let Err(interrupt) = self.feedback(correct, latency) {
                        warn!(%interrupt, "interrupted during feedback");
                        return BlockState::Aborted;
                    }
                }
                if self.deadline_passed(progress.started) {
                    BlockState::Done(BlockEnd::DeadlineReached)
                } else {
                    BlockState::InterStimulusGap
                }
            }
            BlockState::InterStimulusGap => {
                let gap = self.settings.inter_stimulus_gap;
                if !gap.is_zero() {
                    self.presenter.present(Screen::blank());
                    self.timer.sleep(gap);
                }
                progress.cursor += 1;
                BlockState::Ready
            }
            terminal @ (BlockState::Done(_) | BlockState::Aborted) => terminal,
        }
    }

    fn record(
        &self,
        sequence: &[StimulusOf<T>],
        progress: &mut Progress<T>,
        response: ResponseEvent,
    ) -> (bool, Option<Duration>) {
        let cursor = progress.cursor;
        let record = score(self.task, &sequence[cursor], &sequence[..cursor], response);
        debug!(
            index = record.stimulus.index,
            truth = %record.ground_truth,
            key = ?record.response.key,
            rt_ms = record.latency().map(|d| d.as_secs_f64() * 1e3),
            correct = record.is_correct,
            "trial scored"
        );
        let outcome = (record.is_correct, record.latency());
        progress.summary.push(record);
        outcome
    }

    fn feedback(&mut self, correct: bool, latency: Option<Duration>) -> Result<(), Interrupt> {
        self.presenter.present(Screen::Feedback { correct, latency });
        TrialClock::new(&mut *self.keys, self.timer)
            .wait_for(&[Key::Space])
            .map(|_| ())
    }

    fn deadline_passed(&self, started: u64) -> bool {
        self.settings
            .deadline
            .is_some_and(|deadline| self.timer.elapsed(started) >= deadline)
    }
}
