use crate::response::ResponseEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scored result of one presented stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord<S, A> {
    pub stimulus: S,
    pub ground_truth: A,
    pub response: ResponseEvent,
    pub is_correct: bool,
}

impl<S, A> TrialRecord<S, A> {
    pub fn latency(&self) -> Option<Duration> {
        self.response.latency
    }
}

/// Why a block stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockEnd {
    Exhausted,
    DeadlineReached,
    Aborted,
}

/// Records and counters of one block, handed to the caller when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct BlockSummary<S, A> {
    pub total_trials: usize,
    pub correct_trials: usize,
    pub records: Vec<TrialRecord<S, A>>,
    pub end: BlockEnd,
}

impl<S, A> BlockSummary<S, A> {
    pub fn new() -> Self {
        Self {
            total_trials: 0,
            correct_trials: 0,
            records: Vec::new(),
            end: BlockEnd::Exhausted,
        }
    }

    pub fn push(&mut self, record: TrialRecord<S, A>) {
        self.total_trials += 1;
        if record.is_correct {
            self.correct_trials += 1;
        }
        self.records.push(record);
    }

    pub fn is_aborted(&self) -> bool {
        self.end == BlockEnd::Aborted
    }

    /// Fraction of correct trials; no-response trials count as incorrect.
    pub fn accuracy(&self) -> Option<f64> {
        (self.total_trials > 0).then(|| self.correct_trials as f64 / self.total_trials as f64)
    }

    /// Mean latency over trials that received a response.
    pub fn mean_latency(&self) -> Option<Duration> {
        let latencies: Vec<Duration> = self.records.iter().filter_map(|r| r.latency()).collect();
        if latencies.is_empty() {
            return None;
        }
        Some(latencies.iter().sum::<Duration>() / latencies.len() as u32)
    }
}

impl<S, A> Default for BlockSummary<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Extend<TrialRecord<S, A>> for BlockSummary<S, A> {
    fn extend<I: IntoIterator<Item = TrialRecord<S, A>>>(&mut self, records: I) {
        for record in records {
            self.push(record);
        }
    }
}

impl<S, A> FromIterator<TrialRecord<S, A>> for BlockSummary<S, A> {
    fn from_iter<I: IntoIterator<Item = TrialRecord<S, A>>>(records: I) -> Self {
        let mut summary = Self::new();
        summary.extend(records);
        summary
    }
}
