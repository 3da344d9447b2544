//! SSE Stream Decoding
//!
//! Line-buffering Server-Sent-Events decoder for streamed completions.
//! Network chunks do not align with SSE lines, so bytes are held until a
//! newline arrives; nothing beyond the current partial line is buffered.
//!
//! Each `data:` payload goes through a vendor `DeltaParser`. Payloads that
//! fail to decode are logged and skipped; the stream ends at `data: [DONE]`
//! or when the body ends. A body read failure yields one `STREAM_ERROR` and
//! ends the stream.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::unfold;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::{ProviderKind, TextStream};
use crate::types::AiError;

/// Decode one `data:` payload into an optional text delta
pub type DeltaParser = fn(&str) -> Result<Option<String>, serde_json::Error>;

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload (prefix stripped)
    Data(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Holds the trailing partial line between network reads
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    partial: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning events for every completed line
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Parse whatever remains once the body has ended
    pub fn flush(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.partial);
        parse_line(&String::from_utf8_lossy(&rest))
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let trimmed = line.trim();
    let data = trimmed
        .strip_prefix("data:")
        .map(str::trim_start)?;

    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if data.is_empty() {
        return None;
    }
    Some(SseEvent::Data(data.to_string()))
}

struct DeltaState<S> {
    bytes: Pin<Box<S>>,
    lines: SseLineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> DeltaState<S> {
    /// Queue the delta for one event; returns false once `[DONE]` is seen
    fn accept(&mut self, event: SseEvent, parse: DeltaParser, provider: ProviderKind) -> bool {
        match event {
            SseEvent::Done => {
                debug!("{} stream finished", provider.display_name());
                false
            }
            SseEvent::Data(payload) => {
                match parse(&payload) {
                    Ok(Some(delta)) if !delta.is_empty() => self.pending.push_back(delta),
                    Ok(_) => {}
                    Err(e) => warn!(
                        "Skipping malformed {} stream chunk: {}",
                        provider.display_name(),
                        e
                    ),
                }
                true
            }
        }
    }
}

/// Turn a raw byte stream into a stream of text deltas
pub fn delta_stream<S, B, E>(bytes: S, parse: DeltaParser, provider: ProviderKind) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DeltaState {
        bytes: Box::pin(bytes),
        lines: SseLineBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = unfold(state, move |mut state| async move {
        loop {
            if let Some(delta) = state.pending.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in state.lines.feed(chunk.as_ref()) {
                        if !state.accept(event, parse, provider) {
                            state.finished = true;
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let err = AiError::stream(format!("Failed to read response body: {}", e))
                        .with_provider(provider);
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.lines.flush() {
                        state.accept(event, parse, provider);
                    }
                }
            }
        }
    });

    Box::pin(stream)
}
