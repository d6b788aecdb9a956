//! Process-wide preferences that are independent of any access code
//!
//! The theme is durable. The incognito marker and the resumable session code
//! are tab-scoped: they survive a logout/re-entry inside the same process but
//! are gone once the process exits.

use std::sync::Arc;

use tracing::warn;

use crate::core::access_code::AccessCode;
use crate::core::constants::{INCOGNITO_KEY, SESSION_KEY, THEME_KEY};
use crate::core::errors::StorageError;
use crate::core::session::Theme;
use crate::core::storage::Storage;

#[derive(Clone)]
pub struct Preferences {
    durable: Arc<dyn Storage>,
    tab: Arc<dyn Storage>,
}

impl Preferences {
    pub fn new(durable: Arc<dyn Storage>, tab: Arc<dyn Storage>) -> Self {
        Self { durable, tab }
    }

    /// The saved theme, if any. Unreadable or unknown values count as unset.
    pub fn theme(&self) -> Option<Theme> {
        match self.durable.get(THEME_KEY) {
            Ok(Some(raw)) => match raw.parse() {
                Ok(theme) => Some(theme),
                Err(err) => {
                    warn!(error = %err, "ignoring saved theme");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read theme preference");
                None
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.durable.set(THEME_KEY, theme.as_str())
    }

    pub fn is_incognito(&self) -> bool {
        matches!(self.tab.get(INCOGNITO_KEY), Ok(Some(value)) if value == "1")
    }

    /// Turning incognito on also forgets the resumable session code.
    pub fn set_incognito(&self, incognito: bool) -> Result<(), StorageError> {
        if incognito {
            self.tab.set(INCOGNITO_KEY, "1")?;
            self.tab.remove(SESSION_KEY)
        } else {
            self.tab.remove(INCOGNITO_KEY)
        }
    }

    pub fn resumable_code(&self) -> Option<AccessCode> {
        match self.tab.get(SESSION_KEY) {
            Ok(Some(raw)) => AccessCode::parse(&raw).ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read resumable session code");
                None
            }
        }
    }

    pub fn remember_code(&self, code: &AccessCode) -> Result<(), StorageError> {
        self.tab.set(SESSION_KEY, code.as_str())
    }

    pub fn forget_code(&self) -> Result<(), StorageError> {
        self.tab.remove(SESSION_KEY)
    }
}
