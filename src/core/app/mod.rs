//! Application context
//!
//! [`App`] is built once per process and threaded explicitly through the
//! interactive loop. It owns the working conversation state, the stores, the
//! renderer, and the supervised set of running streams.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::core::chat_stream::{ChatStreamService, StreamEnvelope};
use crate::core::config::Config;
use crate::core::preferences::Preferences;
use crate::core::session_store::SessionStore;
use crate::core::storage::Storage;
use crate::ui::renderer::Renderer;

pub mod conversation;
pub mod session;
pub mod settings;
pub mod turns;

pub use conversation::{replay_history, ConversationState, ModelEntry};

/// Collaborators needed to build an [`App`].
pub struct AppInit {
    pub config: Config,
    /// Durable, origin-wide storage (session records, theme).
    pub durable: Arc<dyn Storage>,
    /// Storage that lives as long as this process (the "tab").
    pub tab: Arc<dyn Storage>,
    pub renderer: Box<dyn Renderer>,
}

pub struct App {
    pub config: Config,
    client: reqwest::Client,
    store: SessionStore,
    prefs: Preferences,
    renderer: Box<dyn Renderer>,
    streams: ChatStreamService,
    state: Option<ConversationState>,
    last_turn_id: u64,
}

impl App {
    /// Build the context and hand back the receiver the event loop must drain
    /// into [`App::handle_stream_message`].
    pub fn new(init: AppInit) -> (Self, mpsc::UnboundedReceiver<StreamEnvelope>) {
        let AppInit {
            config,
            durable,
            tab,
            renderer,
        } = init;
        let store = SessionStore::new(durable.clone(), config.default_system_prompt());
        let prefs = Preferences::new(durable, tab);
        let (streams, rx) = ChatStreamService::new();

        let app = Self {
            config,
            client: reqwest::Client::new(),
            store,
            prefs,
            renderer,
            streams,
            state: None,
            last_turn_id: 0,
        };
        (app, rx)
    }

    pub fn state(&self) -> Option<&ConversationState> {
        self.state.as_ref()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn renderer(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn notice(&mut self, message: &str) {
        self.renderer.show_notice(message);
    }

    /// Write the working copy back to durable storage. A no-op without a
    /// session or while incognito. Failures are reported, never fatal.
    pub fn checkpoint(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if state.is_incognito {
            return;
        }
        if let Err(err) = self.store.save(&state.code, &state.session) {
            warn!(code = %state.code, error = %err, "checkpoint failed");
            self.renderer
                .show_notice(&format!("Could not save session: {err}"));
        }
    }
}

#[cfg(test)]
mod tests;
