use tracing::warn;

use super::{App, ConversationState};
use crate::core::errors::{AppError, ValidationError};
use crate::core::models::{default_model_ids, is_builtin_model, CustomModel};
use crate::core::session::Theme;

impl App {
    fn require_state(&mut self) -> Result<&mut ConversationState, ValidationError> {
        self.state.as_mut().ok_or(ValidationError::NoActiveSession)
    }

    /// Replace the credential and system prompt (both trimmed).
    pub fn save_settings(&mut self, api_key: &str, system_prompt: &str) -> Result<(), AppError> {
        let state = self.require_state()?;
        state.session.api_key = api_key.trim().to_string();
        state.session.system_prompt = system_prompt.trim().to_string();
        self.checkpoint();
        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), AppError> {
        let prompt = self.require_state()?.session.system_prompt.clone();
        self.save_settings(api_key, &prompt)
    }

    pub fn set_system_prompt(&mut self, system_prompt: &str) -> Result<(), AppError> {
        let key = self.require_state()?.session.api_key.clone();
        self.save_settings(&key, system_prompt)
    }

    /// Apply a theme everywhere: the durable preference and, if a session is
    /// active, the session itself.
    pub fn switch_theme(&mut self, theme: Theme) {
        if let Err(err) = self.prefs.set_theme(theme) {
            warn!(error = %err, "failed to persist theme preference");
        }
        if let Some(state) = self.state.as_mut() {
            state.session.theme = theme;
        }
        self.renderer.apply_theme(theme);
        self.checkpoint();
    }

    pub fn theme(&self) -> Theme {
        self.state
            .as_ref()
            .map(|state| state.session.theme)
            .or_else(|| self.prefs.theme())
            .unwrap_or_default()
    }

    /// Flip the incognito marker, or force it with `Some`. Returns the new
    /// marker value.
    ///
    /// The active session keeps the mode it was entered with; the marker only
    /// applies from the next [`App::enter_session`].
    pub fn toggle_incognito(&mut self, force: Option<bool>) -> bool {
        let incognito = force.unwrap_or_else(|| !self.prefs.is_incognito());
        if let Err(err) = self.prefs.set_incognito(incognito) {
            warn!(error = %err, "failed to update incognito marker");
        }
        incognito
    }

    /// Whether the active session is incognito, or without one, whether the
    /// next session will be.
    pub fn is_incognito(&self) -> bool {
        match self.state.as_ref() {
            Some(state) => state.is_incognito,
            None => self.prefs.is_incognito(),
        }
    }

    /// Activate or deactivate a known model. Returns whether it is now active.
    pub fn toggle_model(&mut self, model_id: &str) -> Result<bool, AppError> {
        let state = self.require_state()?;
        let known = is_builtin_model(model_id)
            || state.session.custom_models.iter().any(|m| m.id == model_id);
        if !known {
            return Err(ValidationError::UnknownModel(model_id.to_string()).into());
        }

        let active = &mut state.session.active_model_ids;
        let now_active = if let Some(pos) = active.iter().position(|id| id == model_id) {
            active.remove(pos);
            false
        } else {
            active.push(model_id.to_string());
            true
        };
        self.checkpoint();
        Ok(now_active)
    }

    /// Add and activate a custom model.
    pub fn add_custom_model(&mut self, raw_id: &str) -> Result<CustomModel, AppError> {
        let id = raw_id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyModelId.into());
        }
        let state = self.require_state()?;
        if is_builtin_model(id) || state.session.custom_models.iter().any(|m| m.id == id) {
            return Err(ValidationError::DuplicateModel(id.to_string()).into());
        }

        let model = CustomModel::from_id(id);
        state.session.custom_models.push(model.clone());
        if !state.is_active(id) {
            state.session.active_model_ids.push(id.to_string());
        }
        self.checkpoint();
        Ok(model)
    }

    pub fn rename_custom_model(&mut self, model_id: &str, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyModelName.into());
        }
        let state = self.require_state()?;
        let model = state
            .session
            .custom_models
            .iter_mut()
            .find(|m| m.id == model_id)
            .ok_or_else(|| ValidationError::UnknownModel(model_id.to_string()))?;
        model.name = name.to_string();
        self.checkpoint();
        Ok(())
    }

    /// Remove a custom model and deactivate it.
    pub fn remove_custom_model(&mut self, model_id: &str) -> Result<(), AppError> {
        let state = self.require_state()?;
        let before = state.session.custom_models.len();
        state.session.custom_models.retain(|m| m.id != model_id);
        if state.session.custom_models.len() == before {
            return Err(ValidationError::UnknownModel(model_id.to_string()).into());
        }
        state.session.active_model_ids.retain(|id| id != model_id);
        self.checkpoint();
        Ok(())
    }

    /// Drop all custom models and activate every built-in model.
    pub fn reset_models(&mut self) -> Result<(), AppError> {
        let state = self.require_state()?;
        state.session.custom_models.clear();
        state.session.active_model_ids = default_model_ids();
        self.checkpoint();
        Ok(())
    }
}
