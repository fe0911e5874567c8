#![allow(dead_code)]

use cogex_core::{Interrupt, Key, Screen};
use cogex_experiment::Presenter;
use cogex_timing::{KeySource, Timer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Virtual clock advanced only by sleeps and scripted key waits.
#[derive(Default)]
pub struct ManualTimer(AtomicU64);

impl ManualTimer {
    pub fn elapsed_total(&self) -> Duration {
        Duration::from_nanos(self.now())
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
    fn sleep(&self, d: Duration) {
        self.0.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

/// What the participant does during the next wait.
#[derive(Debug, Clone, Copy)]
pub enum Act {
    /// Presses `key` this long after the wait began.
    Press(u64, Key),
    /// Lets the current response window run out.
    Miss,
}

pub fn press(ms: u64, c: char) -> Act {
    Act::Press(ms, Key::Char(c))
}

pub fn space() -> Act {
    Act::Press(50, Key::Space)
}

/// Keyboard driven by a script. Once the script is exhausted every window expires
/// and unbounded waits report closed input.
pub struct ScriptedKeys {
    timer: Arc<ManualTimer>,
    script: VecDeque<Act>,
    pub polls: usize,
}

impl ScriptedKeys {
    pub fn new(timer: Arc<ManualTimer>, script: impl IntoIterator<Item = Act>) -> Self {
        Self {
            timer,
            script: script.into_iter().collect(),
            polls: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeys {
    fn poll_key(
        &mut self,
        timeout: Option<Duration>,
        _alphabet: &[Key],
    ) -> Result<Option<Key>, Interrupt> {
        self.polls += 1;
        match (self.script.front_mut(), timeout) {
            (Some(Act::Press(ms, key)), _) => {
                let after = Duration::from_millis(*ms);
                match timeout {
                    Some(t) if after > t => {
                        *ms -= t.as_millis() as u64;
                        self.timer.sleep(t);
                        Ok(None)
                    }
                    _ => {
                        let key = *key;
                        self.script.pop_front();
                        self.timer.sleep(after);
                        Ok(Some(key))
                    }
                }
            }
            (Some(Act::Miss), Some(t)) => {
                self.script.pop_front();
                self.timer.sleep(t);
                Ok(None)
            }
            (None, Some(t)) => {
                self.timer.sleep(t);
                Ok(None)
            }
            (Some(Act::Miss), None) | (None, None) => Err(Interrupt::InputClosed),
        }
    }
}

/// Keyboard with presses at absolute virtual times. Presses queue until read,
/// and `flush` drops the ones already made.
pub struct TimedKeys {
    timer: Arc<ManualTimer>,
    presses: VecDeque<(Duration, Key)>,
}

impl TimedKeys {
    pub fn new(timer: Arc<ManualTimer>, presses: &[(u64, Key)]) -> Self {
        Self {
            timer,
            presses: presses
                .iter()
                .map(|&(ms, key)| (Duration::from_millis(ms), key))
                .collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.presses.len()
    }
}

impl KeySource for TimedKeys {
    fn poll_key(
        &mut self,
        timeout: Option<Duration>,
        _alphabet: &[Key],
    ) -> Result<Option<Key>, Interrupt> {
        let now = self.timer.elapsed_total();
        match self.presses.front().copied() {
            Some((at, key)) if timeout.map_or(true, |t| at <= now + t) => {
                self.presses.pop_front();
                if at > now {
                    self.timer.sleep(at - now);
                }
                Ok(Some(key))
            }
            _ => match timeout {
                Some(t) => {
                    self.timer.sleep(t);
                    Ok(None)
                }
                None => Err(Interrupt::InputClosed),
            },
        }
    }

    fn flush(&mut self) {
        let now = self.timer.elapsed_total();
        while self.presses.front().is_some_and(|&(at, _)| at <= now) {
            self.presses.pop_front();
        }
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub screens: Vec<Screen>,
}

impl RecordingPresenter {
    pub fn stimuli(&self) -> Vec<&str> {
        self.screens
            .iter()
            .filter_map(|s| match s {
                Screen::Stimulus { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn feedback_count(&self) -> usize {
        self.screens
            .iter()
            .filter(|s| matches!(s, Screen::Feedback { .. }))
            .count()
    }

    pub fn blank_count(&self) -> usize {
        self.screens
            .iter()
            .filter(|s| matches!(s, Screen::Blank { .. }))
            .count()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, screen: Screen) {
        self.screens.push(screen);
    }
}
