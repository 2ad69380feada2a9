//! Reification errors

use thiserror::Error;

use crate::store::StoreError;
use crate::version::{CodecError, VersionId};

/// Result type for reification
pub type ReifyResult<T> = Result<T, ReifyError>;

#[derive(Debug, Error)]
pub enum ReifyError {
    /// The version records a creation: there was no prior state.
    #[error("Version {version_id} records a create; there is no prior state")]
    NothingToReify { version_id: VersionId },

    #[error("Version {version_id} cannot be decoded: {source}")]
    Decode {
        version_id: VersionId,
        #[source]
        source: CodecError,
    },

    /// Stepping back by the lookback leaves the representable time range.
    #[error("Version {version_id} cannot be looked back from by {lookback}")]
    LookbackOutOfRange {
        version_id: VersionId,
        lookback: chrono::Duration,
    },

    /// The resolver returned a child of another type than the association declares.
    #[error("Association {association} expects {expected}, resolver returned {found}")]
    AssociationMismatch {
        association: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReifyError {
    /// Returns true for the typed "did not exist" outcome.
    pub fn is_nothing_to_reify(&self) -> bool {
        matches!(self, ReifyError::NothingToReify { .. })
    }
}
