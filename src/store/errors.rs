//! # Store Errors

use std::io;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Version store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot serve the request right now
    #[error("Version store unavailable: {0}")]
    Unavailable(String),

    #[error("Version store I/O error: {0}")]
    Io(#[from] io::Error),

    /// A persisted line failed its checksum or could not be parsed
    #[error("Corrupted version log at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },

    #[error("Version serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Lock poisoning is reported as unavailability
    pub(crate) fn poisoned() -> Self {
        StoreError::Unavailable("lock poisoned".into())
    }

    /// Returns true if the persisted log cannot be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corrupted { .. })
    }
}
