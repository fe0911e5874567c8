use cogex_core::{ResponseEvent, TrialRecord};

use crate::task::{RecordOf, StimulusOf, Task};

/// Scores one trial. Pure: the same inputs always give the same record.
///
/// A missing response is incorrect whatever the ground truth was.
pub fn score<T: Task>(
    task: &T,
    stimulus: &StimulusOf<T>,
    history: &[StimulusOf<T>],
    response: ResponseEvent,
) -> RecordOf<T> {
    let ground_truth = task.ground_truth(stimulus, history);
    let is_correct = response
        .key
        .and_then(|key| task.interpret(key))
        .is_some_and(|answer| answer == ground_truth);

    TrialRecord {
        stimulus: *stimulus,
        ground_truth,
        response,
        is_correct,
    }
}
