//! Trailing-edge debounce timer.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks when a debounced action is due after a quiet period.
///
/// Every [`trigger`](Self::trigger) pushes the deadline out again; the
/// action runs once, `delay` after the last trigger. The clock is tokio's,
/// so paused-time tests can step through it deterministically.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_event: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register that an event occurred.
    pub fn trigger(&mut self) {
        self.last_event = Some(Instant::now());
    }

    /// When the pending action becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|last| last + self.delay)
    }

    /// Returns `true` once the quiet period has elapsed, clearing the
    /// pending state.
    pub fn should_execute(&mut self) -> bool {
        match self.deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the action is due. `None` if nothing is pending.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancel any pending action.
    pub fn reset(&mut self) {
        self.last_event = None;
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }
}
