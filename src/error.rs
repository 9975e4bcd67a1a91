//! Error types for the FinTrack ledger

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinTrackError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rejected: {0}")]
    Rejected(#[from] RejectionError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

impl FinTrackError {
    /// Field-level messages carried by this error, if it is an input validation error.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FinTrackError::Validation(ValidationError::Fields(errors)) => Some(errors),
            _ => None,
        }
    }
}

/// Inline, per-field validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message recorded for a field wins.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// `Ok(value)` when no field failed, otherwise a [`ValidationError::Fields`].
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError::Fields(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Fields(FieldErrors),

    #[error("Invalid ledger state: {reason}")]
    InvalidState { reason: String },

    #[error("Balance overflow applying {command}")]
    BalanceOverflow { command: &'static str },
}

/// Business-rule rejections. Always surfaced against a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionError {
    #[error("Insufficient balance to complete this transfer")]
    InsufficientBalance { required: Decimal, available: Decimal },
}

impl RejectionError {
    pub fn field(&self) -> &'static str {
        match self {
            RejectionError::InsufficientBalance { .. } => "amount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Deliberately does not say which credential was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No active session, log in to continue")]
    NotLoggedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Cannot {action} while the workflow is in the {state} step")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage read failed for key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Storage write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Storage remove failed for key {key}: {reason}")]
    RemoveFailed { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("Deserialization failed: {reason}")]
    DeserializationFailed { reason: String },

    #[error("Snapshot hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}
