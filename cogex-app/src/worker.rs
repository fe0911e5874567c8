use anyhow::{Context, Result};
use chrono::Local;
use cogex_core::{Interrupt, Key, Screen};
use cogex_experiment::{
    export, ExperimentConfig, NBackTask, Presenter, SessionController, StroopTask, Task,
};
use cogex_timing::{HighPrecisionTimer, KeySource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use winit::event_loop::EventLoopProxy;

use crate::TaskKind;

/// Messages from the session thread to the event loop.
#[derive(Debug, Clone)]
pub enum UserEvent {
    Show(Screen),
    Finished,
}

/// Keys forwarded by the event loop. A dropped sender means the window is gone.
pub struct ChannelKeys {
    rx: Receiver<Key>,
}

impl ChannelKeys {
    pub fn new(rx: Receiver<Key>) -> Self {
        Self { rx }
    }
}

impl KeySource for ChannelKeys {
    fn poll_key(
        &mut self,
        timeout: Option<Duration>,
        _alphabet: &[Key],
    ) -> Result<Option<Key>, Interrupt> {
        match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(key) => Ok(Some(key)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(Interrupt::InputClosed),
            },
            None => self.rx.recv().map(Some).map_err(|_| Interrupt::InputClosed),
        }
    }

    fn flush(&mut self) {
        let stale = self.rx.try_iter().count();
        if stale > 0 {
            debug!(stale, "discarded early key presses");
        }
    }
}

/// Hands screens to the event loop for drawing.
pub struct ProxyDisplay {
    proxy: EventLoopProxy<UserEvent>,
}

impl ProxyDisplay {
    pub fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self { proxy }
    }

    pub fn finish(&self) {
        let _ = self.proxy.send_event(UserEvent::Finished);
    }
}

impl Presenter for ProxyDisplay {
    fn present(&mut self, screen: Screen) {
        if self.proxy.send_event(UserEvent::Show(screen)).is_err() {
            debug!("event loop closed, screen dropped");
        }
    }
}

pub struct SessionJob {
    pub task: TaskKind,
    pub config: ExperimentConfig,
    pub participant: String,
    pub seed: Option<u64>,
}

/// Runs the session off the event-loop thread. The handle yields the result file,
/// if one was written.
pub fn spawn(
    job: SessionJob,
    keys: ChannelKeys,
    display: ProxyDisplay,
) -> Result<JoinHandle<Result<Option<PathBuf>>>> {
    thread::Builder::new()
        .name("cogex-session".into())
        .spawn(move || {
            let mut keys = keys;
            let mut display = display;
            let outcome = match job.task {
                TaskKind::Nback => {
                    let task = NBackTask::new(job.config.nback.clone());
                    run_session(&task, &job, &mut keys, &mut display)
                }
                TaskKind::Stroop => {
                    let task = StroopTask::new(job.config.stroop.clone());
                    run_session(&task, &job, &mut keys, &mut display)
                }
            };
            display.finish();
            outcome
        })
        .context("spawning the session thread")
}

fn run_session<T: Task>(
    task: &T,
    job: &SessionJob,
    keys: &mut ChannelKeys,
    display: &mut ProxyDisplay,
) -> Result<Option<PathBuf>> {
    let timer = HighPrecisionTimer::new();
    let mut rng = match job.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let output = &job.config.output;

    let mut controller = SessionController::new(task, display, keys, &timer);
    let report = controller
        .run(&mut rng)
        .context("invalid experiment configuration")?;

    let saved = if report.is_aborted() && !output.save_on_abort {
        warn!("session aborted, results discarded");
        None
    } else {
        export::save(
            task,
            &report,
            &output.dir,
            &job.participant,
            output.format,
            output.include_practice,
            Local::now(),
        )
        .with_context(|| format!("saving results under {}", output.dir.display()))?
    };

    if !report.is_aborted() {
        let note = saved
            .as_ref()
            .map(|p| format!("Results saved to {}", p.display()));
        if let Err(interrupt) = controller.debrief(&report, note.as_deref()) {
            debug!(%interrupt, "debrief closed");
        }
    }
    info!(
        participant = %job.participant,
        status = ?report.status,
        trials = report.total_trials(),
        "session ended"
    );
    Ok(saved)
}
