// Single-slot ready flag used by the notify/handshake hand-off.

use std::time::{Duration, Instant};

use log::{debug, trace};
use parking_lot::{Condvar, Mutex};

use crate::error::{FragmentError, Result};

/// How long a subscriber waits for the ready flag by default.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);

/// A shared boolean, a mutex and a condition variable.
///
/// The flag is `false` at rest. The producer raises it with [`ReadyGate::signal_ready`]
/// after every subscriber has been notified of a fragment; a subscriber inside
/// [`ReadyGate::consume`] waits (bounded by the timeout) for it, applies the fragment
/// while still holding the lock, then lowers it again.
///
/// Because the producer notifies *before* raising the flag, a purely synchronous
/// subscriber only succeeds when the flag from the previous fragment is still up.
/// The first fragment of a synchronous run therefore always times out. That
/// ordering is intentional and covered by tests; use the rendezvous hand-off
/// (`Gate::rendezvous`) for a strict one-in-flight exchange.
pub struct ReadyGate {
    pub(crate) ready: Mutex<bool>,
    pub(crate) cond: Condvar,
    pub(crate) timeout: Duration,
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            ready: Mutex::new(false),
            cond: Condvar::new(),
            timeout,
        }
    }

    /// Producer side: raise the flag and wake every waiter.
    pub fn signal_ready(&self) {
        let mut ready = self.ready.lock();
        trace!("gate: setting ready");
        *ready = true;
        self.cond.notify_all();
    }

    /// Subscriber side: wait up to the timeout for the flag, run `apply` while
    /// holding the gate, then lower the flag.
    ///
    /// On timeout `apply` is not run and [`FragmentError::HandshakeTimeout`] is
    /// returned; the flag is left as it was.
    pub fn consume<R>(&self, offset: usize, apply: impl FnOnce() -> R) -> Result<R> {
        let start = Instant::now();
        let mut ready = self.ready.lock();
        let waited = self.cond.wait_while_for(&mut ready, |r| !*r, self.timeout);

        if !*ready {
            debug_assert!(waited.timed_out());
            debug!(
                "gate: no ready signal for offset {} after {:?}",
                offset,
                start.elapsed()
            );
            return Err(FragmentError::HandshakeTimeout {
                offset,
                waited_ms: start.elapsed().as_millis(),
            });
        }

        let out = apply();
        *ready = false;
        drop(ready);
        self.cond.notify_all();
        Ok(out)
    }

    /// Current value of the flag.
    pub fn is_ready(&self) -> bool {
        *self.ready.lock()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for ReadyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_ready_gate(self, f)
    }
}
