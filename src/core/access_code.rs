//! Access code validation and generation
//!
//! An access code is an opaque, user-chosen label that scopes one persisted
//! session. It is not a credential: anyone holding the code can read and
//! write that session's data.

use std::fmt;

use crate::core::constants::CODE_MIN_LENGTH;
use crate::core::errors::ValidationError;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Trim surrounding whitespace. Case is preserved.
pub fn normalize(raw: &str) -> &str {
    raw.trim()
}

/// True when `code` has at least [`CODE_MIN_LENGTH`] characters, all ASCII
/// letters or digits.
pub fn is_valid(code: &str) -> bool {
    code.len() >= CODE_MIN_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A normalized, validated access code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessCode(String);

impl AccessCode {
    /// Normalize and validate raw user input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = normalize(raw);
        if is_valid(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(ValidationError::InvalidAccessCode)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a fresh random code of `length` characters (at least the minimum).
pub fn generate_code(length: usize) -> Result<AccessCode, getrandom::Error> {
    let length = length.max(CODE_MIN_LENGTH);
    let mut bytes = vec![0u8; length];
    getrandom::fill(&mut bytes)?;
    let code: String = bytes
        .iter()
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect();
    Ok(AccessCode(code))
}
