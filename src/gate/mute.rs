//! Mute state machine coordinating with the TTS announcer.
//!
//! While the host application speaks an announcement, the recognizer hears
//! the synthesized voice; without muting, the system would react to its own
//! speech. The announcer calls `mute_for_announcement` just before speaking
//! and `unmute_after_announcement` when done; ingestion resumes only after a
//! grace delay so the tail of the announcement cannot trigger a command.
//!
//! The transitions live in a pure [`MuteMachine`] value so the race between
//! a new mute request and a pending unmute timer is deterministic and
//! testable without real timers: every mute bumps an epoch, and a timer that
//! fires with a stale epoch is a no-op.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Mute phase. Initial phase is Listening; there is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutePhase {
    /// Frames flow through the gate
    Listening,
    /// An announcement is being spoken; all frames rejected
    Muted,
    /// Announcement finished, grace timer pending; still rejecting
    Draining,
}

/// Pure mute state machine.
#[derive(Debug, Clone)]
pub struct MuteMachine {
    phase: MutePhase,
    /// Bumped on every transition a timer could race with
    epoch: u64,
    last_transition_at: Instant,
}

impl MuteMachine {
    pub fn new(now: Instant) -> Self {
        Self {
            phase: MutePhase::Listening,
            epoch: 0,
            last_transition_at: now,
        }
    }

    pub fn phase(&self) -> MutePhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == MutePhase::Listening
    }

    pub fn last_transition_at(&self) -> Instant {
        self.last_transition_at
    }

    /// Enters Muted from any phase. A pending drain timer is invalidated by
    /// the epoch bump, so overlapping announcements cannot retrigger
    /// ingestion early.
    pub fn mute(&mut self, now: Instant) {
        self.phase = MutePhase::Muted;
        self.epoch += 1;
        self.last_transition_at = now;
    }

    /// Muted → Draining. Returns the epoch the one-shot timer must present
    /// when it elapses; `None` if not currently Muted.
    pub fn begin_drain(&mut self, now: Instant) -> Option<u64> {
        if self.phase != MutePhase::Muted {
            return None;
        }
        self.phase = MutePhase::Draining;
        self.epoch += 1;
        self.last_transition_at = now;
        Some(self.epoch)
    }

    /// Timer callback: Draining → Listening, but only if no newer transition
    /// happened since the timer was armed.
    pub fn drain_elapsed(&mut self, epoch: u64, now: Instant) -> bool {
        if self.phase != MutePhase::Draining || self.epoch != epoch {
            return false;
        }
        self.phase = MutePhase::Listening;
        self.epoch += 1;
        self.last_transition_at = now;
        true
    }

    /// Returns to Listening and invalidates any pending timer. Used on
    /// listener stop so no state leaks across a stop/start cycle.
    pub fn reset(&mut self, now: Instant) {
        self.phase = MutePhase::Listening;
        self.epoch += 1;
        self.last_transition_at = now;
    }
}

/// Serialized owner of the mute machine, shared between the announcer's
/// lifecycle calls, the grace timer, and the ingest path.
#[derive(Clone)]
pub struct MuteCoordinator {
    machine: Arc<Mutex<MuteMachine>>,
}

impl MuteCoordinator {
    pub fn new() -> Self {
        Self {
            machine: Arc::new(Mutex::new(MuteMachine::new(Instant::now()))),
        }
    }

    /// Announcer hook: called immediately before speaking.
    pub fn mute_for_announcement(&self) {
        if let Ok(mut machine) = self.machine.lock() {
            machine.mute(Instant::now());
            debug!("muted for announcement");
        }
    }

    /// Announcer hook: called when speaking finishes. Starts the one-shot
    /// grace timer; ingestion resumes `delay` later unless a new mute
    /// arrives first.
    pub fn unmute_after_announcement(&self, delay: Duration) -> Option<JoinHandle<()>> {
        let epoch = {
            let mut machine = self.machine.lock().ok()?;
            machine.begin_drain(Instant::now())?
        };

        let machine = Arc::clone(&self.machine);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut machine) = machine.lock()
                && machine.drain_elapsed(epoch, Instant::now())
            {
                debug!("mute grace elapsed, listening again");
            }
        }))
    }

    pub fn phase(&self) -> MutePhase {
        self.machine
            .lock()
            .map(|machine| machine.phase())
            .unwrap_or(MutePhase::Muted)
    }

    pub fn is_listening(&self) -> bool {
        self.phase() == MutePhase::Listening
    }

    /// Cancels any pending grace timer and returns to Listening.
    pub fn reset(&self) {
        if let Ok(mut machine) = self.machine.lock() {
            machine.reset(Instant::now());
        }
    }
}

impl Default for MuteCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase_is_listening() {
        let machine = MuteMachine::new(Instant::now());
        assert_eq!(machine.phase(), MutePhase::Listening);
        assert!(machine.is_listening());
    }

    #[test]
    fn test_mute_then_drain_then_elapse() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);

        machine.mute(t0);
        assert_eq!(machine.phase(), MutePhase::Muted);

        let epoch = machine.begin_drain(t0).unwrap();
        assert_eq!(machine.phase(), MutePhase::Draining);

        assert!(machine.drain_elapsed(epoch, t0));
        assert_eq!(machine.phase(), MutePhase::Listening);
    }

    #[test]
    fn test_begin_drain_requires_muted() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);
        assert_eq!(machine.begin_drain(t0), None);

        machine.mute(t0);
        let epoch = machine.begin_drain(t0).unwrap();
        machine.drain_elapsed(epoch, t0);
        // Back in Listening, a second unmute call must not arm a timer
        assert_eq!(machine.begin_drain(t0), None);
    }

    #[test]
    fn test_mute_during_drain_invalidates_timer() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);

        machine.mute(t0);
        let epoch = machine.begin_drain(t0).unwrap();

        // Overlapping announcement re-mutes before the timer fires
        machine.mute(t0);
        assert_eq!(machine.phase(), MutePhase::Muted);

        // Stale timer must be a no-op
        assert!(!machine.drain_elapsed(epoch, t0));
        assert_eq!(machine.phase(), MutePhase::Muted);
    }

    #[test]
    fn test_stale_timer_after_full_cycle_is_noop() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);

        machine.mute(t0);
        let first = machine.begin_drain(t0).unwrap();
        machine.mute(t0);
        let second = machine.begin_drain(t0).unwrap();

        assert!(!machine.drain_elapsed(first, t0));
        assert_eq!(machine.phase(), MutePhase::Draining);
        assert!(machine.drain_elapsed(second, t0));
        assert_eq!(machine.phase(), MutePhase::Listening);
    }

    #[test]
    fn test_reset_invalidates_pending_timer() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);

        machine.mute(t0);
        let epoch = machine.begin_drain(t0).unwrap();
        machine.reset(t0);

        assert_eq!(machine.phase(), MutePhase::Listening);
        assert!(!machine.drain_elapsed(epoch, t0));
    }

    #[test]
    fn test_last_transition_tracks_time() {
        let t0 = Instant::now();
        let mut machine = MuteMachine::new(t0);
        let t1 = t0 + Duration::from_secs(1);

        machine.mute(t1);
        assert_eq!(machine.last_transition_at(), t1);
    }

    #[tokio::test]
    async fn test_coordinator_grace_timer_resumes_listening() {
        let coordinator = MuteCoordinator::new();

        coordinator.mute_for_announcement();
        assert_eq!(coordinator.phase(), MutePhase::Muted);

        let timer = coordinator
            .unmute_after_announcement(Duration::from_millis(50))
            .unwrap();
        assert_eq!(coordinator.phase(), MutePhase::Draining);

        timer.await.unwrap();
        assert!(coordinator.is_listening());
    }

    #[tokio::test]
    async fn test_coordinator_remute_during_drain_stays_muted() {
        let coordinator = MuteCoordinator::new();

        coordinator.mute_for_announcement();
        let timer = coordinator
            .unmute_after_announcement(Duration::from_millis(50))
            .unwrap();

        // Second announcement starts before the grace elapses
        coordinator.mute_for_announcement();

        timer.await.unwrap();
        // Well past the original deadline, still muted
        assert_eq!(coordinator.phase(), MutePhase::Muted);
    }

    #[tokio::test]
    async fn test_coordinator_unmute_without_mute_is_noop() {
        let coordinator = MuteCoordinator::new();
        assert!(
            coordinator
                .unmute_after_announcement(Duration::from_millis(10))
                .is_none()
        );
        assert!(coordinator.is_listening());
    }

    #[tokio::test]
    async fn test_coordinator_reset_cancels_drain() {
        let coordinator = MuteCoordinator::new();

        coordinator.mute_for_announcement();
        let timer = coordinator
            .unmute_after_announcement(Duration::from_millis(50))
            .unwrap();
        coordinator.reset();

        assert!(coordinator.is_listening());
        timer.await.unwrap();
        assert!(coordinator.is_listening());
    }
}
