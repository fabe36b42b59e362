//! Admission control for transcription frames: debounce and mute gating.

pub mod debounce;
pub mod mute;

pub use debounce::DebounceGate;
pub use mute::{MuteCoordinator, MuteMachine, MutePhase};
