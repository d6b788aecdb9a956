//! Key/value storage backends
//!
//! [`FileStorage`] is the durable, origin-wide store: one file per key in a
//! data directory, replaced atomically on every write. [`MemoryStorage`] lives
//! as long as the process and backs the tab-scoped preferences as well as
//! tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tempfile::NamedTempFile;

use crate::core::errors::StorageError;

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage rooted at the platform data directory.
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("org", "haream", "haream")
            .map(|dirs| Self::new(dirs.data_dir().join("storage")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;

        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };
        let mut temp_file = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        temp_file.write_all(value.as_bytes()).map_err(io_err)?;
        temp_file.as_file_mut().sync_all().map_err(io_err)?;
        temp_file
            .persist(&path)
            .map_err(|source| StorageError::Persist {
                path: path.clone(),
                source,
            })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_key(name).is_ok())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_round_trips_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path().join("nested"));

        assert_eq!(storage.get("alpha").unwrap(), None);
        storage.set("alpha", "{\"a\":1}").unwrap();
        assert_eq!(storage.get("alpha").unwrap().as_deref(), Some("{\"a\":1}"));

        storage.set("alpha", "replaced").unwrap();
        assert_eq!(storage.get("alpha").unwrap().as_deref(), Some("replaced"));
    }

    #[test]
    fn file_storage_remove_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path());

        storage.set("gone", "x").unwrap();
        storage.remove("gone").unwrap();
        storage.remove("gone").unwrap();
        assert_eq!(storage.get("gone").unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path());

        for key in ["../escape", "a/b", "", "dot.ted"] {
            assert!(matches!(
                storage.set(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn file_storage_lists_only_record_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path());
        assert!(storage.keys().unwrap().is_empty());

        storage.set("b_key", "1").unwrap();
        storage.set("a_key", "2").unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a_key", "b_key"]);
    }

    #[test]
    fn memory_storage_behaves_like_a_map() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.keys().unwrap(), vec!["k"]);
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
