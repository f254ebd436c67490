//! Incremental parsing of `text/event-stream` bodies.
//!
//! Network chunks do not align with lines: a chunk can end mid-line, or
//! mid-way through a multi-byte character. [`SseBuffer`] keeps the partial
//! tail between pushes and yields one [`SseEvent`] per complete `data:`
//! line.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::api::GatewayError;
use crate::messages::ChatCompletionChunk;

/// Payload sent by the gateway after the last chunk.
pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload, usually a JSON chunk.
    Data(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Line buffer over a byte stream.
#[derive(Debug, Default)]
pub struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(event) = parse_line(&self.pending[start..end]) {
                events.push(event);
            }
            start = end + 1;
        }
        self.pending.drain(..start);
        events
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let line = std::mem::take(&mut self.pending);
        parse_line(&line)
    }

    /// Bytes buffered waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn parse_line(line: &[u8]) -> Option<SseEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() || line.starts_with(b":") {
        return None;
    }
    let text = String::from_utf8_lossy(line);
    let data = text.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.trim() == DONE_MARKER {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(data.to_string()))
    }
}

/// Text delta carried by one chunk payload, if any.
///
/// Malformed payloads yield `None`.
pub fn delta_content(payload: &str) -> Option<String> {
    let chunk: ChatCompletionChunk = serde_json::from_str(payload).ok()?;
    chunk.choices.into_iter().next()?.delta.content
}

/// Drain a streamed completion into its full text.
pub async fn collect_content<S>(mut stream: S) -> Result<String, GatewayError>
where
    S: Stream<Item = Result<Bytes, GatewayError>> + Unpin,
{
    let mut buffer = SseBuffer::new();
    let mut text = String::new();

    while let Some(chunk) = stream.next().await {
        for event in buffer.push(&chunk?) {
            match event {
                SseEvent::Done => return Ok(text),
                SseEvent::Data(payload) => {
                    if let Some(delta) = delta_content(&payload) {
                        text.push_str(&delta);
                    }
                }
            }
        }
    }
    if let Some(SseEvent::Data(payload)) = buffer.finish() {
        if let Some(delta) = delta_content(&payload) {
            text.push_str(&delta);
        }
    }
    Ok(text)
}
