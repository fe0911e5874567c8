use cogex_core::{Interrupt, Key};
use std::time::Duration;

/// Blocking keyboard access. The only place where the task waits on the participant.
pub trait KeySource {
    /// Waits up to `timeout` (forever when `None`) for one key press.
    ///
    /// `alphabet` lists the keys the caller is interested in; sources may use it to
    /// filter at the device, but callers still check what they receive. Returns
    /// `Ok(None)` on timeout and `Err(Interrupt::InputClosed)` once no more keys
    /// can arrive.
    fn poll_key(&mut self, timeout: Option<Duration>, alphabet: &[Key])
        -> Result<Option<Key>, Interrupt>;

    /// Drops presses queued before stimulus onset.
    fn flush(&mut self) {}
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    fn poll_key(
        &mut self,
        timeout: Option<Duration>,
        alphabet: &[Key],
    ) -> Result<Option<Key>, Interrupt> {
        (**self).poll_key(timeout, alphabet)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}
