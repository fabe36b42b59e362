//! Incremental newline-delimited frame decoding.
//!
//! The transport delivers opaque byte chunks with no relation to message
//! boundaries; a single JSON line may arrive split across many reads, and one
//! read may carry many lines. The decoder owns the carry-over between reads
//! so that a record is surfaced exactly once, only after its terminating
//! delimiter has been observed.

use crate::defaults::MAX_RECORD_BYTES;
use tracing::warn;

/// Incremental decoder splitting a byte stream into complete text lines.
///
/// Decode state is scoped to one connection; drop the decoder when the
/// connection ends.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes received but not yet terminated by a delimiter
    carry: Vec<u8>,
    /// True while skipping the remainder of an oversized record
    discarding: bool,
}

impl FrameDecoder {
    /// Creates a decoder with an empty carry-over buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport chunk, returning every line completed by it.
    ///
    /// Lines are returned in arrival order with the delimiter (and a trailing
    /// `\r`, if any) stripped. A line that is not valid UTF-8 is logged and
    /// skipped; decoding of subsequent lines continues. A record exceeding
    /// [`MAX_RECORD_BYTES`] before its delimiter arrives is discarded in full
    /// so the carry-over stays bounded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.carry.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.carry.drain(..=pos).collect();
            if self.discarding {
                // Tail of an oversized record; resume at the next line
                self.discarding = false;
                continue;
            }
            line.pop(); // delimiter
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            match String::from_utf8(line) {
                Ok(text) => lines.push(text),
                Err(e) => {
                    warn!("discarding non-UTF-8 line: {}", e);
                }
            }
        }

        if self.carry.len() > MAX_RECORD_BYTES {
            if !self.discarding {
                warn!(
                    pending = self.carry.len(),
                    "record exceeds {} bytes without a delimiter, discarding", MAX_RECORD_BYTES
                );
            }
            self.carry.clear();
            self.discarding = true;
        }

        lines
    }

    /// Number of carried-over bytes awaiting a delimiter.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"hello\n");
        assert_eq!(lines, vec!["hello".to_string()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_partial_line_held_back() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"hel").is_empty());
        assert_eq!(decoder.pending(), 3);

        let lines = decoder.feed(b"lo\n");
        assert_eq!(lines, vec!["hello".to_string()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"one\ntwo\nthree\n");
        assert_eq!(
            lines,
            vec!["one".to_string(), "two".to_string(), "three".to_string()]
        );
    }

    #[test]
    fn test_chunk_ending_mid_line() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"one\ntw");
        assert_eq!(lines, vec!["one".to_string()]);
        assert_eq!(decoder.pending(), 2);

        let lines = decoder.feed(b"o\n");
        assert_eq!(lines, vec!["two".to_string()]);
    }

    #[test]
    fn test_crlf_stripped() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"hello\r\nworld\r\n");
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn test_empty_lines_preserved() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"\n\n");
        assert_eq!(lines, vec![String::new(), String::new()]);
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut decoder = FrameDecoder::new();
        let lines = decoder.feed(b"good\n\xff\xfe\nalso good\n");
        assert_eq!(lines, vec!["good".to_string(), "also good".to_string()]);
    }

    #[test]
    fn test_invalid_utf8_does_not_stall_stream() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"\xff\xfe").is_empty());
        let lines = decoder.feed(b"\nnext\n");
        assert_eq!(lines, vec!["next".to_string()]);
    }

    #[test]
    fn test_split_invariance_at_every_byte_boundary() {
        let input: &[u8] = b"{\"type\":\"heartbeat\"}\n{\"type\":\"transcription\",\"text\":\"FINAL:top\",\"timestamp\":1.5}\n{\"type\":\"transcription\",\"text\":\"play\",\"timestamp\":2.0}\n";

        let mut whole = FrameDecoder::new();
        let expected = whole.feed(input);
        assert_eq!(expected.len(), 3);

        for split in 1..input.len() {
            let mut decoder = FrameDecoder::new();
            let mut lines = decoder.feed(&input[..split]);
            lines.extend(decoder.feed(&input[split..]));
            assert_eq!(lines, expected, "mismatch when split at byte {}", split);
        }
    }

    #[test]
    fn test_oversized_record_is_discarded_whole() {
        let mut decoder = FrameDecoder::new();

        // One giant record, delivered in chunks, never a delimiter
        let chunk = vec![b'a'; 16 * 1024];
        for _ in 0..8 {
            assert!(decoder.feed(&chunk).is_empty());
            assert!(decoder.pending() <= MAX_RECORD_BYTES);
        }

        // The tail and delimiter of the oversized record yield nothing
        let lines = decoder.feed(b"aaa\n");
        assert!(lines.is_empty());
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_stream_recovers_after_oversized_record() {
        let mut decoder = FrameDecoder::new();

        let oversized = vec![b'x'; MAX_RECORD_BYTES + 1];
        assert!(decoder.feed(&oversized).is_empty());

        let lines = decoder.feed(b"tail\nnext record\n");
        assert_eq!(lines, vec!["next record".to_string()]);
    }

    #[test]
    fn test_carry_stays_bounded_without_delimiters() {
        let mut decoder = FrameDecoder::new();
        let chunk = vec![b'z'; 8 * 1024];
        for _ in 0..100 {
            decoder.feed(&chunk);
            assert!(decoder.pending() <= MAX_RECORD_BYTES);
        }
    }

    #[test]
    fn test_record_at_cap_still_decodes() {
        let mut decoder = FrameDecoder::new();
        let mut record = vec![b'a'; MAX_RECORD_BYTES - 1];
        record.push(b'\n');

        let lines = decoder.feed(&record);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_RECORD_BYTES - 1);
    }

    #[test]
    fn test_split_invariance_byte_at_a_time() {
        let input = b"alpha\nbeta\ngamma\n";
        let mut decoder = FrameDecoder::new();
        let mut lines = Vec::new();
        for b in input {
            lines.extend(decoder.feed(std::slice::from_ref(b)));
        }
        assert_eq!(
            lines,
            vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
        );
    }
}
