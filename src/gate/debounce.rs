//! Debounce window between accepted commands.
//!
//! A live recognizer re-delivers the same phrase many times while it
//! stabilizes; without a floor between accepted commands, one spoken "top"
//! fires several times. The gate is a plain owned value taking the current
//! instant as an argument, so tests drive it without real timers.

use std::time::{Duration, Instant};

/// Rejects candidate commands arriving too soon after the last accepted one.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// True if a command may be accepted at `now`.
    ///
    /// The first command is always permitted.
    pub fn permits(&self, now: Instant) -> bool {
        match self.last_accepted {
            None => true,
            Some(last) => now.duration_since(last) >= self.window,
        }
    }

    /// Records an accepted command. Only accepted commands move the window;
    /// rejected or unmatched frames leave it untouched.
    pub fn mark_accepted(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
