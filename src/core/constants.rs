//! Shared constants used across the application

/// Minimum number of characters in an access code.
pub const CODE_MIN_LENGTH: usize = 8;

/// Prefix of the durable record key holding one session.
pub const STORAGE_PREFIX: &str = "hareambot_data_";

/// Tab-scoped key remembering which session to resume.
pub const SESSION_KEY: &str = "hareambot_session";

/// Durable, process-wide theme preference.
pub const THEME_KEY: &str = "hareambot_theme";

/// Tab-scoped incognito marker.
pub const INCOGNITO_KEY: &str = "hareambot_incognito";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const DEFAULT_REFERER: &str = "https://github.com/haream/haream";

pub const DEFAULT_APP_TITLE: &str = "HareamBot";

pub const NO_RESPONSE_SAVED: &str = "No response saved.";

pub const EMPTY_HISTORY_MESSAGE: &str = "No previous chats found.";
