//! Persisted session model
//!
//! A [`Session`] is everything stored under one access code. Records are read
//! through a validating deserializer: a field with the wrong shape falls back
//! to its default instead of failing the whole load, so a partially corrupted
//! record still yields a usable session.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::core::constants::DEFAULT_SYSTEM_PROMPT;
use crate::core::models::{default_model_ids, is_builtin_model, CustomModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "theme-light")]
    Light,
    #[serde(rename = "theme-dark")]
    Dark,
    #[serde(rename = "theme-snow")]
    Snow,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Snow];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
            Theme::Snow => "theme-snow",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Snow => "snow",
        }
    }

    /// Dark and snow both use a dark palette.
    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark | Theme::Snow)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("theme-").unwrap_or(trimmed);
        Theme::ALL
            .into_iter()
            .find(|theme| theme.short_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Unknown theme: {trimmed} (expected light, dark or snow)"))
    }
}

/// One user message and the per-model responses it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub id: u64,
    #[serde(rename = "user")]
    pub user_text: String,
    #[serde(rename = "modelIds")]
    pub model_ids: Vec<String>,
    pub responses: BTreeMap<String, String>,
}

impl Turn {
    pub fn new(id: u64, user_text: impl Into<String>, model_ids: Vec<String>) -> Self {
        Self {
            id,
            user_text: user_text.into(),
            model_ids,
            responses: BTreeMap::new(),
        }
    }

    /// Store the final text for `model_id`, replacing any earlier value.
    /// Returns false (and stores nothing) for a model this turn was not sent to.
    pub fn record_response(&mut self, model_id: &str, text: impl Into<String>) -> bool {
        if !self.model_ids.iter().any(|id| id == model_id) {
            return false;
        }
        self.responses.insert(model_id.to_string(), text.into());
        true
    }

    pub fn response(&self, model_id: &str) -> Option<&str> {
        self.responses.get(model_id).map(String::as_str)
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let id = map.get("id").and_then(turn_id_from_value)?;
        let user_text = match map.remove("user") {
            Some(Value::String(text)) => text,
            _ => return None,
        };
        let model_ids = match map.remove("modelIds") {
            Some(value) => string_list(value, "modelIds"),
            None => Vec::new(),
        };

        let mut turn = Turn::new(id, user_text, model_ids);
        if let Some(Value::Object(responses)) = map.remove("responses") {
            for (model_id, text) in responses {
                match text {
                    Value::String(text) => {
                        if !turn.record_response(&model_id, text) {
                            warn!(turn = id, model = %model_id, "dropping response for model outside the turn");
                        }
                    }
                    _ => warn!(turn = id, model = %model_id, "dropping non-text response"),
                }
            }
        }
        Some(turn)
    }
}

fn turn_id_from_value(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

impl<'de> Deserialize<'de> for Turn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Turn::from_value(value).ok_or_else(|| serde::de::Error::custom("malformed turn record"))
    }
}

/// Durable state for one access code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub api_key: String,
    pub system_prompt: String,
    #[serde(rename = "activeModels")]
    pub active_model_ids: Vec<String>,
    pub custom_models: Vec<CustomModel>,
    pub history: Vec<Turn>,
    pub theme: Theme,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Session {
    /// A brand-new session: no key, every built-in model active, empty history.
    pub fn with_system_prompt(system_prompt: &str) -> Self {
        Self {
            api_key: String::new(),
            system_prompt: system_prompt.to_string(),
            active_model_ids: default_model_ids(),
            custom_models: Vec::new(),
            history: Vec::new(),
            theme: Theme::default(),
        }
    }

    /// Merge a stored record over `base`. Fields present in the record win;
    /// fields of the wrong shape become empty collections or keep `base`'s
    /// scalar value. Returns `None` when the record is not an object at all.
    pub fn merge_record(base: Session, record: Value) -> Option<Session> {
        let Value::Object(mut map) = record else {
            return None;
        };
        let mut session = base;

        if let Some(value) = map.remove("apiKey") {
            match value {
                Value::String(key) => session.api_key = key,
                _ => warn!("ignoring non-text apiKey in session record"),
            }
        }
        if let Some(value) = map.remove("systemPrompt") {
            match value {
                Value::String(prompt) => session.system_prompt = prompt,
                _ => warn!("ignoring non-text systemPrompt in session record"),
            }
        }
        if let Some(value) = map.remove("activeModels") {
            session.active_model_ids = dedup(string_list(value, "activeModels"));
        }
        if let Some(value) = map.remove("customModels") {
            session.custom_models = custom_model_list(value);
        }
        if let Some(value) = map.remove("history") {
            session.history = history_list(value);
        }
        if let Some(value) = map.remove("theme") {
            match value.as_str().map(Theme::from_str) {
                Some(Ok(theme)) => session.theme = theme,
                _ => warn!("ignoring unknown theme in session record"),
            }
        }

        Some(session)
    }

    pub fn find_turn_mut(&mut self, turn_id: u64) -> Option<&mut Turn> {
        self.history.iter_mut().find(|turn| turn.id == turn_id)
    }
}

impl<'de> Deserialize<'de> for Session {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Session::merge_record(Session::default(), value)
            .ok_or_else(|| serde::de::Error::custom("session record is not an object"))
    }
}

fn string_list(value: Value, field: &str) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                other => {
                    warn!(field, value = %other, "dropping non-text list entry");
                    None
                }
            })
            .collect(),
        other => {
            warn!(field, value = %other, "expected a list, using an empty one");
            Vec::new()
        }
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn custom_model_list(value: Value) -> Vec<CustomModel> {
    let candidates: Vec<CustomModel> = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<CustomModel>(item).ok())
            .collect(),
        Value::Object(map) => custom_models_from_map(map),
        other => {
            warn!(value = %other, "customModels is not a list, using an empty one");
            Vec::new()
        }
    };

    let mut models: Vec<CustomModel> = Vec::with_capacity(candidates.len());
    for model in candidates {
        if is_builtin_model(&model.id) || models.iter().any(|m| m.id == model.id) {
            warn!(model = %model.id, "dropping duplicate custom model");
            continue;
        }
        models.push(model);
    }
    models
}

fn custom_models_from_map(map: Map<String, Value>) -> Vec<CustomModel> {
    map.into_iter()
        .filter_map(|(id, name)| match name {
            Value::String(name) => Some(CustomModel { id, name }),
            _ => None,
        })
        .collect()
}

fn history_list(value: Value) -> Vec<Turn> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| {
                let turn = Turn::from_value(item);
                if turn.is_none() {
                    warn!("dropping malformed turn from history");
                }
                turn
            })
            .collect(),
        other => {
            warn!(value = %other, "history is not a list, using an empty one");
            Vec::new()
        }
    }
}
