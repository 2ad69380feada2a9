//! Trail errors
//!
//! Every error carries a stable code and a fatality flag, so hosts can
//! decide whether to abort the surrounding work.

use thiserror::Error;

use crate::model::ConfigError;
use crate::reify::ReifyError;
use crate::store::StoreError;
use crate::version::CodecError;

/// Result type for trail operations
pub type TrailResult<T> = Result<T, TrailError>;

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("Reification failed: {0}")]
    Reification(ReifyError),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] CodecError),

    #[error("Model not registered: {0}")]
    UnknownModel(String),

    #[error("{item_type} {item_id} is destroyed; no further versions may be recorded")]
    ItemDestroyed { item_type: String, item_id: String },

    #[error("{item_type} {item_id} has never been persisted")]
    NotPersisted { item_type: String, item_id: String },
}

impl From<ReifyError> for TrailError {
    fn from(err: ReifyError) -> Self {
        match err {
            ReifyError::Store(e) => TrailError::StoreUnavailable(e),
            other => TrailError::Reification(other),
        }
    }
}

impl TrailError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TrailError::Configuration(_) => "TRAIL_CONFIGURATION",
            TrailError::StoreUnavailable(_) => "TRAIL_STORE_UNAVAILABLE",
            TrailError::Reification(_) => "TRAIL_REIFICATION",
            TrailError::Serialization(_) => "TRAIL_SERIALIZATION",
            TrailError::UnknownModel(_) => "TRAIL_UNKNOWN_MODEL",
            TrailError::ItemDestroyed { .. } => "TRAIL_ITEM_DESTROYED",
            TrailError::NotPersisted { .. } => "TRAIL_NOT_PERSISTED",
        }
    }

    /// Returns true if the error leaves the trail unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            TrailError::Configuration(_) => true,
            TrailError::StoreUnavailable(e) => e.is_corruption(),
            _ => false,
        }
    }
}
