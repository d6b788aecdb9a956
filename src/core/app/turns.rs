use tracing::debug;

use super::App;
use crate::core::chat_stream::{StreamEnvelope, StreamKey, StreamMessage, StreamRequest, StreamStatus};
use crate::core::errors::{AppError, ValidationError};
use crate::core::session::Turn;
use crate::ui::renderer::ResponseView;

impl App {
    /// Record a new turn and start one stream per active model. Returns the
    /// turn id without waiting for any stream.
    pub fn submit_turn(&mut self, text: &str) -> Result<u64, AppError> {
        let turn_id = {
            let state = self.state.as_ref().ok_or(ValidationError::NoActiveSession)?;
            let text = text.trim();
            if text.is_empty() {
                return Err(ValidationError::EmptyMessage.into());
            }
            if state.session.api_key.trim().is_empty() {
                return Err(ValidationError::MissingApiKey.into());
            }
            if state.session.active_model_ids.is_empty() {
                return Err(ValidationError::NoActiveModels.into());
            }
            self.next_turn_id()
        };
        let text = text.trim();

        let Some(state) = self.state.as_mut() else {
            return Err(ValidationError::NoActiveSession.into());
        };
        let turn = Turn::new(turn_id, text, state.session.active_model_ids.clone());
        let labels = state.model_labels(&turn.model_ids);
        self.renderer.begin_turn(turn_id, text, &labels);

        let requests: Vec<(StreamKey, StreamRequest)> = turn
            .model_ids
            .iter()
            .map(|model_id| {
                let request = StreamRequest {
                    client: self.client.clone(),
                    base_url: self.config.base_url().to_string(),
                    api_key: state.session.api_key.clone(),
                    referer: self.config.referer().to_string(),
                    app_title: self.config.app_title().to_string(),
                    model: model_id.clone(),
                    system_prompt: state.session.system_prompt.clone(),
                    prompt: text.to_string(),
                };
                (StreamKey::new(turn_id, model_id.clone()), request)
            })
            .collect();

        state.session.history.push(turn);
        self.checkpoint();

        for (key, request) in requests {
            self.streams.spawn_stream(key, request);
        }
        Ok(turn_id)
    }

    /// Apply one message from a running stream. Messages for streams that were
    /// cancelled or have already committed are dropped.
    pub fn handle_stream_message(&mut self, (key, message): StreamEnvelope) {
        if !self.streams.is_running(&key) {
            debug!(turn = key.turn_id, model = %key.model_id, "ignoring message for inactive stream");
            return;
        }

        match message {
            StreamMessage::Progress(text) => {
                self.renderer
                    .update_response(key.turn_id, &key.model_id, &text);
            }
            StreamMessage::Finished { status, text } => {
                self.streams.mark_finished(&key);
                self.commit_response(&key, status, text);
            }
        }
    }

    /// Whether any stream is still running.
    pub fn has_pending_streams(&self) -> bool {
        self.streams.running_count() > 0
    }

    fn commit_response(&mut self, key: &StreamKey, status: StreamStatus, text: String) {
        let view = match status {
            StreamStatus::Errored => ResponseView::Error(&text),
            _ => ResponseView::Text(&text),
        };
        self.renderer.finish_response(key.turn_id, &key.model_id, view);

        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(turn) = state.find_turn_mut(key.turn_id) else {
            debug!(turn = key.turn_id, "finished stream for a turn no longer in history");
            return;
        };
        turn.record_response(&key.model_id, text);
        self.checkpoint();
    }

    /// Millisecond timestamp, bumped when needed so ids strictly increase.
    pub(super) fn next_turn_id(&mut self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_turn_id + 1);
        self.last_turn_id = id;
        id
    }
}
