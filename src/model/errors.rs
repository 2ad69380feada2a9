//! # Configuration Errors
//!
//! Raised when a model or trail configuration is built, never at mutation time.

use thiserror::Error;

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All are fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Item type must not be empty")]
    EmptyItemType,

    #[error("Empty attribute name in `{0}` set")]
    EmptyAttributeName(&'static str),

    #[error("Model {item_type}: every `only` attribute is also ignored or skipped ({attributes:?}), so no change could ever be recorded")]
    UnreachableOnly {
        item_type: String,
        attributes: Vec<String>,
    },

    #[error("Metadata key `{0}` collides with a version column")]
    ReservedMetadataKey(String),

    #[error("Metadata key must not be empty")]
    EmptyMetadataKey,

    #[error("Duplicate has_one association: {0}")]
    DuplicateAssociation(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("Cannot read configuration: {0}")]
    Unreadable(String),
}
