//! Temporal Navigator
//!
//! Moves a record through its history:
//! - `version_at` - the state at a point in time
//! - `previous_version` / `next_version` - one step back or forward
//! - `versions_between` - every state inside a time window
//!
//! A reified record remembers its source version, which anchors the steps.
//! A live record has no source: stepping back starts from the newest
//! version, stepping forward is not possible.

use chrono::{DateTime, Utc};

use super::engine::{ReifyOptions, Reifier};
use super::errors::{ReifyError, ReifyResult};
use crate::model::{Association, ModelRegistry, Record};
use crate::store::VersionStore;
use crate::version::Version;

/// Host lookup of live `has_one` children.
pub trait AssociationResolver: Send + Sync {
    /// The live child linked to `parent` through `association`, if it exists.
    fn resolve(&self, parent: &Record, association: &Association) -> Option<Record>;
}

/// Resolver for hosts without `has_one` associations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssociations;

impl AssociationResolver for NoAssociations {
    fn resolve(&self, _parent: &Record, _association: &Association) -> Option<Record> {
        None
    }
}

/// Read-only navigation over a version store.
pub struct Navigator<'a> {
    store: &'a dyn VersionStore,
    reifier: &'a Reifier,
    registry: &'a ModelRegistry,
    resolver: &'a dyn AssociationResolver,
}

impl<'a> Navigator<'a> {
    pub fn new(
        store: &'a dyn VersionStore,
        reifier: &'a Reifier,
        registry: &'a ModelRegistry,
        resolver: &'a dyn AssociationResolver,
    ) -> Self {
        Self {
            store,
            reifier,
            registry,
            resolver,
        }
    }

    /// Reify `version`, with its `has_one` children if asked.
    pub fn reify(&self, version: &Version, options: ReifyOptions) -> ReifyResult<Record> {
        let mut record = self.reifier.reify(version)?;
        if options.has_one {
            self.attach_has_one(&mut record, version, options)?;
        }
        Ok(record)
    }

    /// The record as it was at `at`.
    ///
    /// `None` if the item did not exist yet. If nothing changed after `at`,
    /// the record as given.
    pub fn version_at(
        &self,
        record: &Record,
        at: DateTime<Utc>,
        options: ReifyOptions,
    ) -> ReifyResult<Option<Record>> {
        match self.store.first_after(record.item_type(), record.id(), at)? {
            Some(version) => self.reify_or_none(&version, options),
            None => Ok(Some(record.clone())),
        }
    }

    /// One step back in history.
    pub fn previous_version(
        &self,
        record: &Record,
        options: ReifyOptions,
    ) -> ReifyResult<Option<Record>> {
        let previous = match record.version() {
            Some(source) => self.store.preceding(source)?,
            None => self.store.last(record.item_type(), record.id())?,
        };

        match previous {
            Some(version) => self.reify_or_none(&version, options),
            None => Ok(None),
        }
    }

    /// One step forward in history. `None` for live records and at the newest version.
    pub fn next_version(
        &self,
        record: &Record,
        options: ReifyOptions,
    ) -> ReifyResult<Option<Record>> {
        let source = match record.version() {
            Some(source) => source,
            None => return Ok(None),
        };

        match self.store.following(source)? {
            Some(version) => self.reify_or_none(&version, options),
            None => Ok(None),
        }
    }

    /// States the item passed through for versions created in `[from, to]`.
    pub fn versions_between(
        &self,
        record: &Record,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        options: ReifyOptions,
    ) -> ReifyResult<Vec<Record>> {
        let mut states = Vec::new();
        for version in self.store.between(record.item_type(), record.id(), from, to)? {
            if let Some(state) = self.version_at(record, version.created_at(), options)? {
                states.push(state);
            }
        }
        Ok(states)
    }

    /// Zero-based position of `version` in its item's history.
    pub fn index(&self, version: &Version) -> ReifyResult<Option<usize>> {
        Ok(self
            .store
            .list_ordered(version.item_type(), version.item_id())?
            .iter()
            .position(|v| v.id() == version.id()))
    }

    /// Whodunnit of the item's most recent version.
    pub fn originator(&self, record: &Record) -> ReifyResult<Option<String>> {
        Ok(self
            .store
            .last(record.item_type(), record.id())?
            .and_then(|v| v.whodunnit().map(str::to_string)))
    }

    fn reify_or_none(
        &self,
        version: &Version,
        options: ReifyOptions,
    ) -> ReifyResult<Option<Record>> {
        match self.reify(version, options) {
            Ok(record) => Ok(Some(record)),
            Err(ReifyError::NothingToReify { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn attach_has_one(
        &self,
        record: &mut Record,
        version: &Version,
        options: ReifyOptions,
    ) -> ReifyResult<()> {
        let config = match self.registry.get(version.item_type()) {
            Some(config) => config,
            None => return Ok(()),
        };

        let at = version
            .created_at()
            .checked_sub_signed(options.lookback)
            .ok_or(ReifyError::LookbackOutOfRange {
                version_id: version.id(),
                lookback: options.lookback,
            })?;
        // Children are reified one level deep.
        let child_options = ReifyOptions {
            has_one: false,
            ..options
        };

        for association in config.has_one() {
            let child = match self.resolver.resolve(record, association) {
                Some(live) if live.item_type() != association.item_type() => {
                    return Err(ReifyError::AssociationMismatch {
                        association: association.name().to_string(),
                        expected: association.item_type().to_string(),
                        found: live.item_type().to_string(),
                    });
                }
                Some(live) => self.version_at(&live, at, child_options)?,
                None => None,
            };
            record.attach_association(association.name(), child);
        }
        Ok(())
    }
}
