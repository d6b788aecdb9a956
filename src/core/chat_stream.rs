//! One streamed chat completion per (turn, model)
//!
//! [`stream_completion`] owns the request/response lifecycle of a single
//! stream and turns every failure into a terminal state. [`ChatStreamService`]
//! supervises the running streams: each one is a task in a `JoinSet` with its
//! own cancellation token, and reports back over a channel so that the
//! conversation state is only ever touched by the receiving loop.

use std::collections::HashMap;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::chat_completions_url;

const DONE_TOKEN: &str = "[DONE]";

/// Identifies one stream: the turn it answers and the model answering it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey {
    pub turn_id: u64,
    pub model_id: String,
}

impl StreamKey {
    pub fn new(turn_id: u64, model_id: impl Into<String>) -> Self {
        Self {
            turn_id,
            model_id: model_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Pending,
    Streaming,
    Done,
    Errored,
}

/// Transient per-stream state. `accumulated_text` only grows until an error
/// replaces it with the error description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamState {
    pub status: StreamStatus,
    pub accumulated_text: String,
}

impl Default for StreamState {
    fn default() -> Self {
        Self {
            status: StreamStatus::Pending,
            accumulated_text: String::new(),
        }
    }
}

impl StreamState {
    fn append(&mut self, fragment: &str) {
        self.accumulated_text.push_str(fragment);
    }

    fn finish(&mut self) {
        self.status = StreamStatus::Done;
    }

    fn fail(&mut self, description: impl std::fmt::Display) {
        self.status = StreamStatus::Errored;
        self.accumulated_text = format!("Error: {description}");
    }
}

/// One decoded `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A content fragment to append.
    Content(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Interpret one protocol line. Lines that are not `data:` events, events
/// that do not decode, and events without content all yield `None`.
pub fn parse_sse_line(line: &str) -> Option<SseEvent> {
    // Lenient about surrounding whitespace: `data:x` and ` data: x` both count.
    let payload = line.trim().strip_prefix("data:")?.trim_start();
    if payload == DONE_TOKEN {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .first_content()
            .map(|content| SseEvent::Content(content.to_string())),
        Err(err) => {
            debug!(error = %err, "dropping undecodable stream event");
            None
        }
    }
}

/// Splits a byte stream into lines, holding back an incomplete trailing line
/// until the next chunk (or [`SseLineDecoder::finish`]) completes it.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            if let Some(event) = decode_line(&self.buffer[..newline_pos]) {
                events.push(event);
            }
            self.buffer.drain(..=newline_pos);
        }

        events
    }

    /// Flush a final line that arrived without a newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(bytes: &[u8]) -> Option<SseEvent> {
    match std::str::from_utf8(bytes) {
        Ok(line) => parse_sse_line(line),
        Err(err) => {
            debug!(error = %err, "dropping stream line with invalid UTF-8");
            None
        }
    }
}

/// Everything needed to run one stream.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub referer: String,
    pub app_title: String,
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
}

/// Run one stream to completion. `on_progress` sees the full accumulated text
/// after every appended fragment. Never fails: transport problems end in
/// [`StreamStatus::Errored`] with the description as the final text.
pub async fn stream_completion(
    request: &StreamRequest,
    mut on_progress: impl FnMut(&str),
) -> StreamState {
    let mut state = StreamState::default();
    let body = ChatRequest::streaming(&request.model, &request.system_prompt, &request.prompt);

    let http_request = request
        .client
        .post(chat_completions_url(&request.base_url))
        .header("Content-Type", "application/json");
    let http_request = add_auth_headers(
        http_request,
        &request.api_key,
        &request.referer,
        &request.app_title,
    );

    let response = match http_request.json(&body).send().await {
        Ok(response) => response,
        Err(err) => {
            state.fail(err);
            return state;
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(model = %request.model, status = status.as_u16(), "stream rejected");
        state.fail(format_args!("API Error: {}", status.as_u16()));
        return state;
    }

    state.status = StreamStatus::Streaming;
    let mut stream = response.bytes_stream();
    let mut decoder = SseLineDecoder::default();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                state.fail(err);
                return state;
            }
        };

        for event in decoder.feed(&chunk) {
            match event {
                SseEvent::Content(fragment) => {
                    state.append(&fragment);
                    on_progress(&state.accumulated_text);
                }
                SseEvent::Done => {
                    state.finish();
                    return state;
                }
            }
        }
    }

    if let Some(SseEvent::Content(fragment)) = decoder.finish() {
        state.append(&fragment);
        on_progress(&state.accumulated_text);
    }
    state.finish();
    state
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// Full text accumulated so far.
    Progress(String),
    /// The stream reached a terminal state. Sent exactly once unless cancelled.
    Finished { status: StreamStatus, text: String },
}

pub type StreamEnvelope = (StreamKey, StreamMessage);

/// Supervised set of running streams.
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<StreamEnvelope>,
    tasks: JoinSet<()>,
    tokens: HashMap<StreamKey, CancellationToken>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: JoinSet::new(),
                tokens: HashMap::new(),
            },
            rx,
        )
    }

    /// Launch a stream. Must be called from within a tokio runtime.
    pub fn spawn_stream(&mut self, key: StreamKey, request: StreamRequest) {
        let cancel_token = CancellationToken::new();
        if let Some(previous) = self.tokens.insert(key.clone(), cancel_token.clone()) {
            previous.cancel();
        }

        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            debug!(turn = key.turn_id, model = %key.model_id, "stream started");
            let progress_tx = tx.clone();
            let progress_key = key.clone();
            tokio::select! {
                state = stream_completion(&request, |text| {
                    let _ = progress_tx.send((progress_key.clone(), StreamMessage::Progress(text.to_string())));
                }) => {
                    debug!(turn = key.turn_id, model = %key.model_id, status = ?state.status, "stream finished");
                    let _ = tx.send((
                        key,
                        StreamMessage::Finished {
                            status: state.status,
                            text: state.accumulated_text,
                        },
                    ));
                }
                _ = cancel_token.cancelled() => {
                    debug!(turn = key.turn_id, model = %key.model_id, "stream cancelled");
                }
            }
        });
    }

    /// Forget a finished stream and reap completed tasks.
    pub fn mark_finished(&mut self, key: &StreamKey) {
        self.tokens.remove(key);
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(err) = result {
                if err.is_panic() {
                    debug!(error = %err, "stream task panicked");
                }
            }
        }
    }

    pub fn is_running(&self, key: &StreamKey) -> bool {
        self.tokens.contains_key(key)
    }

    pub fn running_count(&self) -> usize {
        self.tokens.len()
    }

    /// Cancel every outstanding stream. Cancelled streams never report a
    /// terminal message.
    pub fn cancel_all(&mut self) {
        for (_, token) in self.tokens.drain() {
            token.cancel();
        }
        self.tasks.abort_all();
    }

    #[cfg(test)]
    pub fn track_for_test(&mut self, key: StreamKey) {
        self.tokens.insert(key, CancellationToken::new());
    }
}

impl Drop for ChatStreamService {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
