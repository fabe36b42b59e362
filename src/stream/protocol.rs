//! JSON wire protocol for the transcription stream.
//!
//! The external recognizer process sends one JSON object per line over a
//! persistent TCP connection. The channel is strictly producer-to-consumer;
//! nothing is ever written back.

use serde::{Deserialize, Serialize};

/// One decoded protocol record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    /// Liveness-only record, never produces output
    Heartbeat,
    /// A recognized utterance, live or final
    Transcription {
        text: String,
        /// Seconds since the epoch as sent by the producer (`time.time()`)
        timestamp: f64,
    },
}

impl Record {
    /// Deserialize a record from one JSON line.
    ///
    /// Unknown extra fields (some producer versions add an `isFinal` flag)
    /// are ignored; finality is carried in the text prefix instead.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize a record to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
