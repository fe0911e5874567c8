mod common;

use chrono::Local;
use cogex_core::Key;
use cogex_experiment::{
    export, BlockTiming, NBackConfig, NBackTask, ResultFormat, SessionController, StroopConfig,
    StroopTask,
};
use common::{press, space, Act, ManualTimer, RecordingPresenter, ScriptedKeys};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_dir(name: &str) -> PathBuf {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("cogex_{name}_{suffix}"))
}

#[test]
fn session_aborted_before_any_trial_writes_no_file() {
    let task = NBackTask::new(NBackConfig::default());
    let timer = Arc::new(ManualTimer::default());
    let mut keys = ScriptedKeys::new(timer.clone(), [Act::Press(10, Key::Escape)]);
    let mut presenter = RecordingPresenter::default();
    let mut rng = StdRng::seed_from_u64(1);

    let report = SessionController::new(&task, &mut presenter, &mut keys, timer.as_ref())
        .run(&mut rng)
        .expect("valid config");
    assert!(report.is_aborted());

    let dir = temp_dir("empty");
    let saved = export::save(&task, &report, &dir, "p1", ResultFormat::Csv, true, Local::now())
        .expect("nothing to write is not an error");

    assert_eq!(saved, None);
    assert!(!dir.exists());
}

#[test]
fn stroop_results_have_separate_background_word_and_ink_columns() {
    let task = StroopTask::new(StroopConfig {
        timing: BlockTiming {
            practice_trials: 0,
            block_trials: 2,
            response_window_ms: 2000,
            practice_response_window_ms: None,
            inter_stimulus_ms: 0,
            session_duration_s: None,
        },
    });
    let timer = Arc::new(ManualTimer::default());
    let mut keys = ScriptedKeys::new(
        timer.clone(),
        [space(), space(), space(), press(400, 'r'), Act::Miss],
    );
    let mut presenter = RecordingPresenter::default();
    let mut rng = StdRng::seed_from_u64(9);

    let report = SessionController::new(&task, &mut presenter, &mut keys, timer.as_ref())
        .run(&mut rng)
        .expect("valid config");

    let dir = temp_dir("stroop");
    let path = export::save(&task, &report, &dir, "p2", ResultFormat::Csv, false, Local::now())
        .expect("write")
        .expect("trials were recorded");

    let written = fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "phase,block,trial_index,background,word,ink,response,latency_ms,ground_truth,is_correct"
    );
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first.len(), 10);
    assert_eq!(&first[..3], ["experiment", "0", "0"]);
    assert!(["black", "gray"].contains(&first[3]));
    assert_eq!(first[6], "r");
    assert_eq!(first[7], "400");
    let second: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(second[6], "none");
    assert_eq!(second[7], "");
    assert_eq!(second[9], "false");

    fs::remove_dir_all(dir).expect("cleanup");
}
