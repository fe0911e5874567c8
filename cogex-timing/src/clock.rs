use crate::keys::KeySource;
use crate::timer::Timer;
use cogex_core::{Interrupt, Key, ResponseEvent};
use std::time::Duration;
use tracing::trace;

/// Response window of a single trial.
pub struct TrialClock<'a, K: ?Sized, T: ?Sized> {
    keys: &'a mut K,
    timer: &'a T,
}

impl<'a, K, T> TrialClock<'a, K, T>
where
    K: KeySource + ?Sized,
    T: Timer + ?Sized,
{
    pub fn new(keys: &'a mut K, timer: &'a T) -> Self {
        Self { keys, timer }
    }

    /// Arms the window at onset and returns the first press from `alphabet`.
    ///
    /// Later presses in the same window are never seen. Keys outside `alphabet`
    /// are ignored, `Escape` aborts. With `window == None` the wait is unbounded.
    pub fn await_response(
        &mut self,
        window: Option<Duration>,
        alphabet: &[Key],
    ) -> Result<ResponseEvent, Interrupt> {
        self.keys.flush();
        let onset = self.timer.now();

        loop {
            let elapsed = self.timer.elapsed(onset);
            let remaining = match window {
                Some(window) if elapsed >= window => {
                    trace!(?elapsed, "response window expired");
                    return Ok(ResponseEvent::none());
                }
                Some(window) => Some(window - elapsed),
                None => None,
            };

            match self.keys.poll_key(remaining, alphabet)? {
                Some(Key::Escape) => return Err(Interrupt::Cancelled),
                Some(key) if alphabet.contains(&key) => {
                    let latency = self.timer.elapsed(onset);
                    trace!(%key, ?latency, "response accepted");
                    return Ok(ResponseEvent::pressed(key, latency));
                }
                Some(key) => trace!(%key, "ignoring key outside response alphabet"),
                None => {}
            }
        }
    }

    /// Waits without limit for one of `alphabet`, e.g. Space on an instruction page.
    pub fn wait_for(&mut self, alphabet: &[Key]) -> Result<Key, Interrupt> {
        self.keys.flush();
        loop {
            match self.keys.poll_key(None, alphabet)? {
                Some(Key::Escape) => return Err(Interrupt::Cancelled),
                Some(key) if alphabet.contains(&key) => return Ok(key),
                _ => {}
            }
        }
    }
}
