//! voxpick - Voice-command ingest for live transcription streams
//!
//! Listens on a local TCP port for newline-delimited JSON transcription
//! records from an external speech recognizer, matches a small command
//! vocabulary with word-boundary priority matching, and emits debounced,
//! mute-gated command events to decoupled consumers.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod cli;
pub mod command;
pub mod config;
pub mod defaults;
pub mod error;
pub mod gate;
pub mod instance;
pub mod listener;
pub mod stream;

// Pipeline stages (decode → classify → gate → interpret → dispatch)
pub use command::dispatch::{CommandEvent, CommandHandler, CommandRouter};
pub use command::interpreter::{CommandKind, Interpreter};
pub use gate::debounce::DebounceGate;
pub use gate::mute::{MuteCoordinator, MuteMachine, MutePhase};
pub use stream::classifier::TranscriptionFrame;
pub use stream::decoder::FrameDecoder;
pub use stream::protocol::Record;

// Listener surface
pub use listener::VoiceListener;

// Error handling
pub use error::{Result, VoxpickError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
