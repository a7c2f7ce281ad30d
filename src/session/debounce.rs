//! Trailing-edge debouncer with injected time.
//!
//! Event bursts (keystrokes, resize drags, selection sweeps) are
//! collapsed to a single action once the burst goes quiet. Time is a
//! plain millisecond counter supplied by the caller, so tests drive the
//! clock by hand and the session loop passes its own tick time.

/// Holds at most one pending value with a fire deadline. Re-queuing
/// replaces the value and pushes the deadline out.
#[derive(Debug, Clone, Default)]
pub struct Debouncer<T> {
    pending: Option<(u64, T)>,
}

impl<T> Debouncer<T> {
    /// Create an idle debouncer.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Queue `value` to fire `delay_ms` after `now_ms`, replacing any
    /// value already pending.
    pub fn queue(&mut self, value: T, now_ms: u64, delay_ms: u64) {
        self.pending = Some((now_ms + delay_ms, value));
    }

    /// Take the pending value if its deadline has passed.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now_ms => {
                self.pending.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Drop any pending value without firing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a value is queued and not yet fired.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
