use tracing::{info, warn};

use super::{replay_history, App, ConversationState};
use crate::core::access_code::AccessCode;
use crate::core::constants::EMPTY_HISTORY_MESSAGE;
use crate::core::errors::AppError;

impl App {
    /// Enter (or create) the session for `raw_code`. On a validation error
    /// nothing changes, including any session already active.
    pub fn enter_session(&mut self, raw_code: &str) -> Result<(), AppError> {
        let code = AccessCode::parse(raw_code)?;
        let is_incognito = self.prefs.is_incognito();

        let session = if is_incognito {
            self.store.fresh_session()
        } else {
            match self.store.load(&code)? {
                Some(session) => session,
                None => {
                    let session = self.store.fresh_session();
                    self.store.save(&code, &session)?;
                    info!(%code, "claimed new session");
                    session
                }
            }
        };

        self.streams.cancel_all();
        let remembered = if is_incognito {
            self.prefs.forget_code()
        } else {
            self.prefs.remember_code(&code)
        };
        if let Err(err) = remembered {
            warn!(error = %err, "failed to update resumable session code");
        }

        let mut state = ConversationState::new(code, session, is_incognito);
        if let Some(theme) = self.prefs.theme() {
            state.session.theme = theme;
        }
        self.renderer.apply_theme(state.session.theme);
        info!(code = %state.code, incognito = is_incognito, turns = state.session.history.len(), "entered session");

        if !state.session.history.is_empty() && !is_incognito {
            replay_history(
                &state.session.history,
                &state.session.custom_models,
                self.renderer.as_mut(),
            );
        } else {
            self.renderer.clear_transcript();
            self.renderer.show_welcome(EMPTY_HISTORY_MESSAGE);
        }

        self.state = Some(state);
        Ok(())
    }

    /// Re-enter the session remembered for this process, unless incognito.
    /// Returns `None` when there is nothing to resume.
    pub fn resume(&mut self) -> Option<Result<(), AppError>> {
        if self.prefs.is_incognito() {
            return None;
        }
        let code = self.prefs.resumable_code()?;
        Some(self.enter_session(code.as_str()))
    }

    /// Leave the current session. Outstanding streams are cancelled and their
    /// partial text is discarded.
    pub fn logout(&mut self) {
        self.streams.cancel_all();
        self.renderer.discard_pending();
        if let Err(err) = self.prefs.forget_code() {
            warn!(error = %err, "failed to forget session code");
        }
        self.state = None;
    }

    /// Delete the durable record of the current session, then log out.
    /// Incognito sessions have no record, so nothing is removed for them.
    pub fn reset_session(&mut self) -> Result<(), AppError> {
        if let Some(state) = self.state.as_ref() {
            if !state.is_incognito {
                self.store.remove(&state.code)?;
                info!(code = %state.code, "session data removed");
            }
        }
        self.logout();
        Ok(())
    }
}
