//! Per-connection ingest: decode → classify → gate → interpret → emit.
//!
//! One sequential pass per connection; decode order is arrival order.
//! Emission hands off to the dispatcher channel and never blocks on
//! consumers.

use crate::command::dispatch::CommandEvent;
use crate::command::interpreter::{CommandKind, Interpreter};
use crate::config::Config;
use crate::gate::debounce::DebounceGate;
use crate::gate::mute::MuteCoordinator;
use crate::stream::classifier::{TranscriptionFrame, classify};
use crate::stream::decoder::FrameDecoder;
use crate::stream::protocol::Record;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

/// Gating and interpretation state.
///
/// Shared across connections: the debounce window and mute phase survive a
/// producer reconnect, only decode state is connection-scoped.
pub struct IngestState {
    interpreter: Interpreter,
    debounce: DebounceGate,
    mute: MuteCoordinator,
    interim_min_length: usize,
    strong_triggers: Vec<String>,
    events_tx: mpsc::UnboundedSender<CommandEvent>,
}

impl IngestState {
    pub fn new(
        config: &Config,
        mute: MuteCoordinator,
        events_tx: mpsc::UnboundedSender<CommandEvent>,
    ) -> Self {
        Self {
            interpreter: Interpreter::new(),
            debounce: DebounceGate::new(Duration::from_millis(config.debounce.window_ms)),
            mute,
            interim_min_length: config.interim.min_length,
            strong_triggers: config.interim.strong_triggers.clone(),
            events_tx,
        }
    }

    /// Processes one decoded line, returning the accepted command kind if
    /// the line survived parsing, classification, and gating.
    ///
    /// Malformed records are logged and skipped; they never interrupt the
    /// stream.
    pub fn process_line(&mut self, line: &str) -> Option<CommandKind> {
        if line.trim().is_empty() {
            return None;
        }

        let record = match Record::from_json(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("discarding malformed record: {}", e);
                return None;
            }
        };

        let frame = classify(record)?;
        self.admit(frame)
    }

    /// Gate order: mute, debounce, interim eligibility, then interpretation.
    /// Only a produced command moves the debounce window.
    fn admit(&mut self, frame: TranscriptionFrame) -> Option<CommandKind> {
        if !self.mute.is_listening() {
            trace!(text = %frame.text, "rejected: muted");
            return None;
        }

        let now = Instant::now();
        if !self.debounce.permits(now) {
            trace!(text = %frame.text, "rejected: within debounce window");
            return None;
        }

        if !frame.is_final && !self.interim_eligible(&frame.text) {
            trace!(text = %frame.text, "rejected: interim not yet eligible");
            return None;
        }

        let kind = self.interpreter.interpret(&frame.text)?;
        self.debounce.mark_accepted(now);

        let event = CommandEvent {
            kind,
            text: frame.text,
            timestamp: frame.timestamp,
            accepted_at: now,
        };
        if self.events_tx.send(event).is_err() {
            trace!("dispatcher gone, dropping command");
        }

        Some(kind)
    }

    /// An interim partial is acted on early only when it already contains a
    /// strong trigger token and has stabilized past the minimum length.
    fn interim_eligible(&self, text: &str) -> bool {
        text.chars().count() >= self.interim_min_length
            && self.interpreter.contains_trigger(text, &self.strong_triggers)
    }
}

/// Reads one connection until EOF or error, feeding every chunk through a
/// fresh decoder into the shared ingest state.
pub async fn run_connection<R>(mut reader: R, state: Arc<Mutex<IngestState>>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                info!("producer disconnected");
                break;
            }
            Ok(n) => {
                let lines = decoder.feed(&buf[..n]);
                match state.lock() {
                    Ok(mut state) => {
                        for line in &lines {
                            state.process_line(line);
                        }
                    }
                    Err(_) => {
                        warn!("ingest state poisoned, closing connection");
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("connection read error: {}", e);
                break;
            }
        }
    }
}
