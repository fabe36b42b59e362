//! Live/final transcription classification.

use crate::defaults::FINAL_PREFIX;
use crate::stream::protocol::Record;

/// A transcription ready for gating and interpretation.
///
/// `text` is trimmed and non-empty; the `FINAL:` sentinel has already been
/// stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionFrame {
    /// Recognized text with the finality prefix removed
    pub text: String,
    /// True for a finalized utterance, false for a live partial hypothesis
    pub is_final: bool,
    /// Producer timestamp in seconds
    pub timestamp: f64,
}

/// Classifies a decoded record into a transcription frame.
///
/// Heartbeats carry no text and are discarded, as are transcriptions that
/// are empty after trimming.
pub fn classify(record: Record) -> Option<TranscriptionFrame> {
    let (text, timestamp) = match record {
        Record::Heartbeat => return None,
        Record::Transcription { text, timestamp } => (text, timestamp),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (text, is_final) = match trimmed.strip_prefix(FINAL_PREFIX) {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };

    // A bare "FINAL:" with no utterance behind it carries nothing to act on
    if text.is_empty() {
        return None;
    }

    Some(TranscriptionFrame {
        text: text.to_string(),
        is_final,
        timestamp,
    })
}
