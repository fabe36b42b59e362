//! Inbound transcription stream: wire protocol, frame decoding, classification.

pub mod classifier;
pub mod decoder;
pub mod protocol;

pub use classifier::{TranscriptionFrame, classify};
pub use decoder::FrameDecoder;
pub use protocol::Record;
