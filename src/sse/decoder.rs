//! Line-framed event decoder for the analysis response stream.
//!
//! DESIGN
//! ======
//! The transport hands over arbitrary byte chunks. Lines are split on `\n`
//! and an incomplete trailing line is carried (as bytes, so a multi-byte
//! UTF-8 sequence cut by a chunk boundary is reassembled) until the next
//! chunk. Only lines with the `data:` prefix are frames. A frame is always
//! complete within its line, so a JSON decode failure means a non-data
//! control line and is skipped, never retried.

use serde_json::Value;
use tracing::trace;

/// Prefix that marks an event frame line.
pub const FRAME_PREFIX: &str = "data:";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

// =============================================================================
// EVENTS
// =============================================================================

/// A decoded frame, as seen by the extraction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Informational stage update from the backend.
    Progress { stage: String, message: String },
    /// The backend or provider failed mid-stream.
    Error(String),
    /// A slice of model output text.
    ContentDelta(String),
    /// End-of-stream sentinel.
    Done,
}

// =============================================================================
// DECODER
// =============================================================================

/// Incremental frame decoder. One instance per stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    finished: bool,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the sentinel has been decoded; later input is ignored.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one transport chunk and return the events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.carry.extend_from_slice(chunk);
        let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') else {
            return events;
        };
        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        for line in complete.split(|&b| b == b'\n') {
            if self.decode_line(line, &mut events) {
                self.carry.clear();
                break;
            }
        }
        events
    }

    /// Flush a residual unterminated line at transport EOF.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        let residual = std::mem::take(&mut self.carry);
        self.decode_line(&residual, &mut events);
        events
    }

    /// Decode one line into `events`. Returns `true` when the sentinel was hit.
    fn decode_line(&mut self, line: &[u8], events: &mut Vec<StreamEvent>) -> bool {
        let text = String::from_utf8_lossy(line);
        let text = text.strip_suffix('\r').unwrap_or(text.as_ref());
        let Some(payload) = text.strip_prefix(FRAME_PREFIX) else {
            return false;
        };
        let payload = payload.strip_prefix(' ').unwrap_or(payload);

        if payload.trim() == DONE_SENTINEL {
            self.finished = true;
            events.push(StreamEvent::Done);
            return true;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => {
                if let Some(event) = classify_frame(&value) {
                    events.push(event);
                }
            }
            Err(e) => trace!(error = %e, "stream: skipping undecodable frame"),
        }
        false
    }
}

/// Map a decoded frame payload onto a [`StreamEvent`], if it is one we act on.
#[must_use]
pub fn classify_frame(value: &Value) -> Option<StreamEvent> {
    let kind = value.get("type").and_then(Value::as_str);

    if kind == Some("error") || value.get("error").is_some_and(|e| !e.is_null()) {
        return Some(StreamEvent::Error(error_message(value)));
    }

    match kind {
        Some("progress") => Some(StreamEvent::Progress {
            stage: str_field(value, "stage"),
            message: str_field(value, "message"),
        }),
        Some("content_block_delta") => value
            .get("delta")
            .and_then(|d| d.get("text"))
            .and_then(Value::as_str)
            .map(|text| StreamEvent::ContentDelta(text.to_owned())),
        _ => None,
    }
}

fn error_message(value: &Value) -> String {
    match value.get("error") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| Value::Object(obj.clone()).to_string(), str::to_owned),
        Some(other) if !other.is_null() => other.to_string(),
        _ => value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown stream error")
            .to_owned(),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
#[path = "decoder_test.rs"]
mod tests;
