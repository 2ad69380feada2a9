//! Payload codec
//!
//! Stored payloads are opaque strings. The codec is the only component
//! that knows their format; everything else handles attribute maps.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::model::Attributes;

/// `{attribute: (before, after)}` for the attributes that took part in a change.
pub type Changeset = BTreeMap<String, (Value, Value)>;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode failed: {0}")]
    Encode(String),

    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Encode/decode capability for version payloads.
pub trait ObjectCodec: Send + Sync {
    /// Short name of the format, for diagnostics.
    fn name(&self) -> &'static str;

    /// Encode an attribute snapshot.
    fn encode_object(&self, object: &Attributes) -> CodecResult<String>;

    /// Decode an attribute snapshot.
    fn decode_object(&self, blob: &str) -> CodecResult<Attributes>;

    /// Encode a changeset.
    fn encode_changes(&self, changes: &Changeset) -> CodecResult<String>;

    /// Decode a changeset.
    fn decode_changes(&self, blob: &str) -> CodecResult<Changeset>;
}

/// JSON payload codec.
///
/// Attribute maps are `BTreeMap`s, so output key order is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ObjectCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_object(&self, object: &Attributes) -> CodecResult<String> {
        serde_json::to_string(object).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode_object(&self, blob: &str) -> CodecResult<Attributes> {
        serde_json::from_str(blob).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode_changes(&self, changes: &Changeset) -> CodecResult<String> {
        serde_json::to_string(changes).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode_changes(&self, blob: &str) -> CodecResult<Changeset> {
        serde_json::from_str(blob).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
