//! Built-in model catalog and custom model entries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinModel {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_MODELS: &[BuiltinModel] = &[
    BuiltinModel {
        id: "deepseek/deepseek-r1:free",
        name: "DeepSeek R1 (Free)",
    },
    BuiltinModel {
        id: "google/gemini-2.0-flash-exp:free",
        name: "Gemini 2.0 (Free)",
    },
    BuiltinModel {
        id: "meta-llama/llama-3.2-11b-vision-instruct:free",
        name: "Llama 3.2 (Free)",
    },
    BuiltinModel {
        id: "mistralai/mistral-7b-instruct:free",
        name: "Mistral 7B (Free)",
    },
];

/// A user-added model, stored per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModel {
    pub id: String,
    pub name: String,
}

impl CustomModel {
    /// Build an entry whose display name is derived from the id: the part
    /// after the first `/` (or the whole id) with its first letter upper-cased.
    pub fn from_id(id: &str) -> Self {
        let tail = id
            .split('/')
            .nth(1)
            .filter(|part| !part.is_empty())
            .unwrap_or(id);
        let mut chars = tail.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self {
            id: id.to_string(),
            name,
        }
    }
}

pub fn default_model_ids() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.id.to_string()).collect()
}

pub fn find_builtin_model(id: &str) -> Option<&'static BuiltinModel> {
    DEFAULT_MODELS.iter().find(|m| m.id == id)
}

pub fn is_builtin_model(id: &str) -> bool {
    find_builtin_model(id).is_some()
}

/// Display name for `id`, looking at built-ins first, then custom models.
/// Unknown ids display as themselves.
pub fn model_name<'a>(id: &'a str, custom_models: &'a [CustomModel]) -> &'a str {
    if let Some(builtin) = find_builtin_model(id) {
        return builtin.name;
    }
    custom_models
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name.as_str())
        .unwrap_or(id)
}
