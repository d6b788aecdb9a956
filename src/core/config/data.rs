use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::constants::{
    DEFAULT_APP_TITLE, DEFAULT_BASE_URL, DEFAULT_REFERER, DEFAULT_SYSTEM_PROMPT,
};

/// Application-level settings. Credentials, prompts and model selection are
/// deliberately absent: they belong to a session, not to the installation.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Chat API base URL (defaults to OpenRouter)
    pub base_url: Option<String>,
    /// Where session records are stored (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Value of the `HTTP-Referer` attribution header
    pub referer: Option<String>,
    /// Value of the `X-Title` attribution header
    pub app_title: Option<String>,
    /// `tracing` filter directive, e.g. "warn" or "haream=debug"
    pub log_level: Option<String>,
    /// System prompt given to brand-new sessions
    pub default_system_prompt: Option<String>,
}

impl Config {
    pub fn base_url(&self) -> &str {
        non_empty(self.base_url.as_deref()).unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn referer(&self) -> &str {
        non_empty(self.referer.as_deref()).unwrap_or(DEFAULT_REFERER)
    }

    pub fn app_title(&self) -> &str {
        non_empty(self.app_title.as_deref()).unwrap_or(DEFAULT_APP_TITLE)
    }

    pub fn log_level(&self) -> &str {
        non_empty(self.log_level.as_deref()).unwrap_or("warn")
    }

    pub fn default_system_prompt(&self) -> &str {
        non_empty(self.default_system_prompt.as_deref()).unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/haream/config.toml` → `~/.config/haream/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
