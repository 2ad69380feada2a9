//! Reification Engine
//!
//! Rebuilds the record a version describes. Read-only: nothing here
//! touches the store's contents.

use std::sync::Arc;

use chrono::Duration;

use super::errors::{ReifyError, ReifyResult};
use crate::model::Record;
use crate::version::{Changeset, ObjectCodec, Version};

/// Default window subtracted from a parent version's timestamp when
/// looking up the state of its `has_one` children.
pub const DEFAULT_HAS_ONE_LOOKBACK_SECS: i64 = 3;

/// Reification options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReifyOptions {
    /// Reify configured `has_one` associations alongside the record
    pub has_one: bool,
    /// How far before the parent version the child state is taken
    pub lookback: Duration,
}

impl Default for ReifyOptions {
    fn default() -> Self {
        Self {
            has_one: false,
            lookback: Duration::seconds(DEFAULT_HAS_ONE_LOOKBACK_SECS),
        }
    }
}

impl ReifyOptions {
    /// Options with `has_one` reification switched on.
    pub fn with_has_one() -> Self {
        Self {
            has_one: true,
            ..Self::default()
        }
    }

    pub fn lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }
}

/// Decodes stored payloads back into records.
pub struct Reifier {
    codec: Arc<dyn ObjectCodec>,
}

impl Reifier {
    pub fn new(codec: Arc<dyn ObjectCodec>) -> Self {
        Self { codec }
    }

    /// The record as it was before `version`'s event.
    pub fn reify(&self, version: &Version) -> ReifyResult<Record> {
        let blob = version.object().ok_or(ReifyError::NothingToReify {
            version_id: version.id(),
        })?;

        let attributes = self
            .codec
            .decode_object(blob)
            .map_err(|source| ReifyError::Decode {
                version_id: version.id(),
                source,
            })?;

        Ok(Record::reified(version, attributes))
    }

    /// The decoded changeset, empty when the version carries none.
    pub fn changeset(&self, version: &Version) -> ReifyResult<Changeset> {
        match version.object_changes() {
            None => Ok(Changeset::new()),
            Some(blob) => self
                .codec
                .decode_changes(blob)
                .map_err(|source| ReifyError::Decode {
                    version_id: version.id(),
                    source,
                }),
        }
    }
}
