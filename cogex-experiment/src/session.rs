use cogex_core::{ConfigError, Interrupt, Key, Phase, Screen};
use cogex_timing::{KeySource, Timer, TrialClock};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::presenter::Presenter;
use crate::runner::{BlockRunner, BlockSettings};
use crate::task::{SummaryOf, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Aborted,
}

/// Everything a session produced, complete even when it was aborted.
#[derive(Debug, Clone)]
pub struct SessionReport<T: Task> {
    pub task: &'static str,
    pub practice: Option<SummaryOf<T>>,
    pub blocks: Vec<SummaryOf<T>>,
    pub status: SessionStatus,
}

impl<T: Task> SessionReport<T> {
    fn new(task: &'static str) -> Self {
        Self {
            task,
            practice: None,
            blocks: Vec::new(),
            status: SessionStatus::Completed,
        }
    }

    fn aborted(mut self) -> Self {
        self.status = SessionStatus::Aborted;
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.status == SessionStatus::Aborted
    }

    /// Timed trials only; practice is excluded from the totals.
    pub fn total_trials(&self) -> usize {
        self.blocks.iter().map(|b| b.total_trials).sum()
    }

    pub fn correct_trials(&self) -> usize {
        self.blocks.iter().map(|b| b.correct_trials).sum()
    }

    /// All timed blocks merged into one summary.
    pub fn combined(&self) -> SummaryOf<T> {
        self.blocks
            .iter()
            .flat_map(|b| b.records.iter().cloned())
            .collect()
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.combined().accuracy()
    }

    pub fn mean_latency(&self) -> Option<Duration> {
        self.combined().mean_latency()
    }

    /// Blocks in presentation order, tagged with their phase and a 0-based block number.
    pub fn phased_blocks(&self) -> impl Iterator<Item = (Phase, usize, &SummaryOf<T>)> {
        self.practice
            .iter()
            .map(|b| (Phase::Practice, 0, b))
            .chain(
                self.blocks
                    .iter()
                    .enumerate()
                    .map(|(n, b)| (Phase::Experiment, n, b)),
            )
    }
}

/// Instructions, practice, then timed blocks until the session budget is spent.
pub struct SessionController<'a, T, P: ?Sized, K: ?Sized, C: ?Sized> {
    task: &'a T,
    presenter: &'a mut P,
    keys: &'a mut K,
    timer: &'a C,
    phase: Phase,
}

impl<'a, T, P, K, C> SessionController<'a, T, P, K, C>
where
    T: Task,
    P: Presenter + ?Sized,
    K: KeySource + ?Sized,
    C: Timer + ?Sized,
{
    pub fn new(task: &'a T, presenter: &'a mut P, keys: &'a mut K, timer: &'a C) -> Self {
        Self {
            task,
            presenter,
            keys,
            timer,
            phase: Phase::Instructions,
        }
    }

    /// The phase the session has reached.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the whole session. Configuration problems surface before anything is shown;
    /// a participant abort ends the session with [`SessionStatus::Aborted`].
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SessionReport<T>, ConfigError> {
        self.task.validate()?;
        let timing = self.task.timing().clone();
        let mut report = SessionReport::new(self.task.name());
        info!(task = report.task, phase = %self.phase, "session started");

        for page in self.task.instructions() {
            if let Err(interrupt) = self.page(page) {
                warn!(%interrupt, phase = %self.phase, "session aborted");
                return Ok(report.aborted());
            }
        }

        if timing.practice_trials > 0 {
            self.enter(Phase::Practice);
            let sequence = self.task.generate(timing.practice_trials, rng)?;
            let summary = self.block(BlockSettings::practice(&timing)).run(&sequence);
            let aborted = summary.is_aborted();
            report.practice = Some(summary);
            if aborted {
                return Ok(report.aborted());
            }
            if let Err(interrupt) =
                self.page("Practice finished.\n\nPress SPACE to start the experiment")
            {
                warn!(%interrupt, phase = %self.phase, "session aborted");
                return Ok(report.aborted());
            }
        }

        self.enter(Phase::Experiment);
        debug!(budget = ?timing.session_duration(), "session budget");
        let started = self.timer.now();
        loop {
            let deadline = match timing.session_duration() {
                Some(total) => {
                    let elapsed = self.timer.elapsed(started);
                    if elapsed >= total {
                        break;
                    }
                    Some(total - elapsed)
                }
                None if !report.blocks.is_empty() => break,
                None => None,
            };

            let sequence = self.task.generate(timing.block_trials, rng)?;
            let summary = self.block(BlockSettings::timed(&timing, deadline)).run(&sequence);
            let aborted = summary.is_aborted();
            let empty = summary.total_trials == 0;
            report.blocks.push(summary);
            if aborted {
                return Ok(report.aborted());
            }
            if empty {
                break;
            }
        }

        info!(
            task = report.task,
            blocks = report.blocks.len(),
            trials = report.total_trials(),
            accuracy = report.accuracy().map(|a| a * 100.0),
            mean_rt_ms = report.mean_latency().map(|d| d.as_secs_f64() * 1e3),
            "session completed"
        );
        Ok(report)
    }

    /// Closing screen with the timed-trial totals and an optional note such as the
    /// result file location.
    pub fn debrief(
        &mut self,
        report: &SessionReport<T>,
        note: Option<&str>,
    ) -> Result<(), Interrupt> {
        self.enter(Phase::Debrief);
        let mut text = format!(
            "The experiment is over!\n\nTrials completed: {}",
            report.total_trials()
        );
        if let Some(accuracy) = report.accuracy() {
            text.push_str(&format!("\nAccuracy: {:.1}%", accuracy * 100.0));
        }
        if let Some(note) = note {
            text.push_str("\n\n");
            text.push_str(note);
        }
        text.push_str("\n\nPress SPACE to exit");
        self.page(text)
    }

    /// Steps through [`Phase::next`] until `target`; earlier phases are left as they are.
    fn enter(&mut self, target: Phase) {
        while self.phase < target {
            match self.phase.next() {
                Some(next) => self.phase = next,
                None => break,
            }
        }
        info!(phase = %self.phase, "phase started");
    }

    fn page(&mut self, text: impl Into<String>) -> Result<(), Interrupt> {
        self.presenter.present(Screen::instructions(text));
        TrialClock::new(&mut *self.keys, self.timer)
            .wait_for(&[Key::Space])
            .map(|_| ())
    }

    fn block(&mut self, settings: BlockSettings) -> BlockRunner<'_, T, P, K, C> {
        BlockRunner::new(self.task, &mut *self.presenter, &mut *self.keys, self.timer, settings)
    }
}
