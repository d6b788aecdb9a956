use crate::core::access_code::AccessCode;
use crate::core::models::{self, CustomModel, DEFAULT_MODELS};
use crate::core::session::{Session, Turn};
use crate::ui::renderer::{ModelLabel, Renderer, ResponseView};

/// Working copy of the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub code: AccessCode,
    pub session: Session,
    /// Never persisted; recomputed from the tab-scoped marker.
    pub is_incognito: bool,
}

/// One row of the model picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub label: ModelLabel,
    pub active: bool,
    pub custom: bool,
}

impl ConversationState {
    pub fn new(code: AccessCode, session: Session, is_incognito: bool) -> Self {
        Self {
            code,
            session,
            is_incognito,
        }
    }

    pub fn model_name<'a>(&'a self, id: &'a str) -> &'a str {
        models::model_name(id, &self.session.custom_models)
    }

    pub fn model_labels(&self, ids: &[String]) -> Vec<ModelLabel> {
        ids.iter()
            .map(|id| ModelLabel {
                id: id.clone(),
                name: self.model_name(id).to_string(),
            })
            .collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.session.active_model_ids.iter().any(|m| m == id)
    }

    /// Built-in models followed by custom ones.
    pub fn model_entries(&self) -> Vec<ModelEntry> {
        let builtin = DEFAULT_MODELS.iter().map(|m| (m.id, m.name, false));
        let custom = self
            .session
            .custom_models
            .iter()
            .map(|m: &CustomModel| (m.id.as_str(), m.name.as_str(), true));

        builtin
            .chain(custom)
            .map(|(id, name, custom)| ModelEntry {
                label: ModelLabel {
                    id: id.to_string(),
                    name: name.to_string(),
                },
                active: self.is_active(id),
                custom,
            })
            .collect()
    }

    pub fn find_turn_mut(&mut self, turn_id: u64) -> Option<&mut Turn> {
        self.session.find_turn_mut(turn_id)
    }
}

/// Render stored turns without any network activity. Turns that were sent to
/// no model are skipped.
pub fn replay_history(history: &[Turn], custom_models: &[CustomModel], renderer: &mut dyn Renderer) {
    renderer.clear_transcript();
    for turn in history.iter().filter(|turn| !turn.model_ids.is_empty()) {
        let labels: Vec<ModelLabel> = turn
            .model_ids
            .iter()
            .map(|id| ModelLabel {
                id: id.clone(),
                name: models::model_name(id, custom_models).to_string(),
            })
            .collect();
        renderer.begin_turn(turn.id, &turn.user_text, &labels);

        for model_id in &turn.model_ids {
            let view = match turn.response(model_id) {
                Some(text) if !text.is_empty() => ResponseView::Text(text),
                _ => ResponseView::Missing,
            };
            renderer.finish_response(turn.id, model_id, view);
        }
    }
}
