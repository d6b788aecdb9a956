//! Durable session records keyed by access code

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::access_code::{self, AccessCode};
use crate::core::constants::STORAGE_PREFIX;
use crate::core::errors::StorageError;
use crate::core::session::Session;
use crate::core::storage::Storage;

/// Reads and writes whole [`Session`] records. There is no partial update:
/// callers always hand over the fully merged session.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    default_system_prompt: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>, default_system_prompt: impl Into<String>) -> Self {
        Self {
            storage,
            default_system_prompt: default_system_prompt.into(),
        }
    }

    /// A session with no stored record yet.
    pub fn fresh_session(&self) -> Session {
        Session::with_system_prompt(&self.default_system_prompt)
    }

    pub fn storage_key(code: &AccessCode) -> String {
        format!("{STORAGE_PREFIX}{code}")
    }

    /// Load the record for `code`. A missing record and a record that cannot
    /// be decoded both come back as `None`; the latter is logged.
    pub fn load(&self, code: &AccessCode) -> Result<Option<Session>, StorageError> {
        let key = Self::storage_key(code);
        let Some(raw) = self.storage.get(&key)? else {
            return Ok(None);
        };

        let record = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(%code, error = %err, "failed to parse saved session, starting fresh");
                return Ok(None);
            }
        };

        match Session::merge_record(self.fresh_session(), record) {
            Some(session) => {
                debug!(%code, turns = session.history.len(), "loaded session");
                Ok(Some(session))
            }
            None => {
                warn!(%code, "saved session is not an object, starting fresh");
                Ok(None)
            }
        }
    }

    pub fn save(&self, code: &AccessCode, session: &Session) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(session).map_err(StorageError::Encode)?;
        self.storage.set(&Self::storage_key(code), &encoded)
    }

    pub fn remove(&self, code: &AccessCode) -> Result<(), StorageError> {
        self.storage.remove(&Self::storage_key(code))
    }

    /// Access codes that currently have a stored record.
    pub fn list_codes(&self) -> Result<Vec<AccessCode>, StorageError> {
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .filter_map(|key| {
                let code = key.strip_prefix(STORAGE_PREFIX)?;
                access_code::is_valid(code)
                    .then(|| AccessCode::parse(code).ok())
                    .flatten()
            })
            .collect())
    }
}
