use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::core::constants::CODE_MIN_LENGTH;

/// A user action was rejected before any state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAccessCode,
    EmptyMessage,
    MissingApiKey,
    NoActiveModels,
    /// No session has been entered yet.
    NoActiveSession,
    DuplicateModel(String),
    UnknownModel(String),
    EmptyModelId,
    EmptyModelName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidAccessCode => write!(
                f,
                "Access code must be at least {CODE_MIN_LENGTH} characters and contain only letters and numbers."
            ),
            ValidationError::EmptyMessage => write!(f, "Message is empty."),
            ValidationError::MissingApiKey => {
                write!(f, "Please set your OpenRouter API Key in settings.")
            }
            ValidationError::NoActiveModels => write!(f, "Select at least one model."),
            ValidationError::NoActiveSession => write!(f, "Enter an access code first."),
            ValidationError::DuplicateModel(_) => write!(f, "Model already exists!"),
            ValidationError::UnknownModel(id) => write!(f, "Unknown model: {id}"),
            ValidationError::EmptyModelId => write!(f, "Model id cannot be empty."),
            ValidationError::EmptyModelName => write!(f, "Model name cannot be empty."),
        }
    }
}

impl StdError for ValidationError {}

/// Failure talking to a storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// The key contains characters the backend cannot address.
    InvalidKey(String),
    Encode(serde_json::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: {key:?}"),
            StorageError::Encode(err) => write!(f, "Failed to encode record: {err}"),
            StorageError::Io { path, source } => {
                write!(f, "Storage I/O failed at {}: {}", path.display(), source)
            }
            StorageError::Persist { path, source } => {
                write!(f, "Failed to persist record at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StorageError::InvalidKey(_) => None,
            StorageError::Encode(source) => Some(source),
            StorageError::Io { source, .. } => Some(source),
            StorageError::Persist { source, .. } => Some(source),
        }
    }
}

/// Failure of a user-triggered application operation.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Storage(StorageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(err) => err.fmt(f),
            AppError::Storage(err) => err.fmt(f),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Validation(err) => Some(err),
            AppError::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}
