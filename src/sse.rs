//! Normalized event-stream codec.
//!
//! The relay re-encodes upstream model deltas as line-oriented events:
//! one `data: {"text": ...}` line per fragment, terminated by the
//! `data: [DONE]` sentinel, each followed by a blank line. The consumer
//! decodes the same framing incrementally, surviving chunk boundaries that
//! split lines or multi-byte UTF-8 sequences.

use serde::Deserialize;

/// Prefix of every normalized event line.
pub const DATA_PREFIX: &str = "data: ";

/// Terminal marker signaling the logical end of a normalized stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A normalized unit of the relay output stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamEvent {
    /// A text fragment to append to the in-progress message.
    Text(String),
    /// The completion sentinel.
    Done,
}

/// Payload shape of a `Text` event line.
#[derive(Debug, Deserialize)]
struct TextPayload {
    text: String,
}

/// Encode a single event as one normalized frame.
#[must_use]
pub fn encode_event(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Text(text) => {
            format!("{DATA_PREFIX}{}\n\n", serde_json::json!({ "text": text }))
        }
        StreamEvent::Done => format!("{DATA_PREFIX}{DONE_SENTINEL}\n\n"),
    }
}

/// Incremental line splitter that yields only `data: ` payloads.
///
/// Bytes are buffered until a full line is available, so a chunk boundary may
/// fall anywhere, including inside a multi-byte UTF-8 sequence. Lines that are
/// not valid UTF-8 or do not carry the data prefix are dropped.
#[derive(Debug, Default)]
pub struct DataLineDecoder {
    buffer: Vec<u8>,
}

impl DataLineDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect the data payloads of every line
    /// completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = &raw[..raw.len() - 1];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }

            let Ok(text) = std::str::from_utf8(line) else {
                tracing::trace!("skipping non-UTF-8 stream line");
                continue;
            };
            if let Some(payload) = text.strip_prefix(DATA_PREFIX) {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }
}

/// Decoder for the normalized stream the relay produces.
///
/// The sentinel latches: once seen, every later payload is swallowed, so
/// trailing bytes in the same chunk (or later chunks) cannot mutate state.
/// Malformed payloads are skipped, never surfaced.
#[derive(Debug, Default)]
pub struct NormalizedDecoder {
    lines: DataLineDecoder,
    done: bool,
}

impl NormalizedDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the completion sentinel has been observed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of bytes and collect the decoded events.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for payload in self.lines.push(chunk) {
            if self.done {
                continue;
            }
            if payload == DONE_SENTINEL {
                self.done = true;
                events.push(StreamEvent::Done);
                continue;
            }
            match serde_json::from_str::<TextPayload>(&payload) {
                Ok(decoded) => events.push(StreamEvent::Text(decoded.text)),
                Err(err) => tracing::trace!("skipping malformed event payload: {err}"),
            }
        }
        events
    }
}
