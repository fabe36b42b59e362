//! Default configuration constants for voxpick.
//!
//! Shared constants used across configuration types to ensure consistency
//! and eliminate duplication.

/// Default TCP port the transcription producer connects to.
///
/// The external recognizer process dials this port on localhost and streams
/// newline-delimited JSON records over the connection.
pub const LISTENER_PORT: u16 = 8889;

/// Default debounce window in milliseconds.
///
/// Minimum elapsed time between two accepted commands. 1000ms absorbs the
/// rapid re-deliveries a live recognizer produces while a phrase stabilizes.
pub const DEBOUNCE_WINDOW_MS: u64 = 1000;

/// Default mute grace delay in milliseconds.
///
/// Wait period after an announcement finishes before ingestion resumes, so
/// the tail of the synthesized speech cannot trigger a command.
pub const MUTE_GRACE_MS: u64 = 2000;

/// Literal prefix marking a finalized utterance on the wire.
///
/// The producer sends `FINAL:<text>` for stabilized transcriptions; anything
/// else is an interim partial hypothesis.
pub const FINAL_PREFIX: &str = "FINAL:";

/// Minimum character count for an interim transcription to be eligible.
///
/// Interim partials shorter than this are too unstable to act on.
pub const MIN_INTERIM_LENGTH: usize = 3;

/// Trigger tokens strong enough to accept from an interim transcription.
///
/// A live partial is acted on early only when it already contains one of
/// these whole tokens; everything else waits for finalization. Latency vs.
/// precision tunable, overridable in config.
pub const STRONG_TRIGGERS: &[&str] =
    &["top", "bottom", "play", "pause", "stop", "first", "second"];

/// Grace period in milliseconds to wait after signaling a stale prior
/// instance before binding the port.
pub const STALE_INSTANCE_GRACE_MS: u64 = 500;

/// Upper bound on the byte length of a single wire record.
///
/// A producer that never sends a newline would otherwise grow the decoder's
/// carry-over without limit. Real transcription records are well under 1 KiB;
/// anything past this is a broken producer and gets discarded.
pub const MAX_RECORD_BYTES: usize = 64 * 1024;
