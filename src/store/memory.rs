//! In-memory version store

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::errors::{StoreError, StoreResult};
use super::VersionStore;
use crate::version::{Version, VersionDraft, VersionId};

type ItemKey = (String, String);

/// Per-item ordered version chains with id allocation.
///
/// Shared by the memory and file stores. Each chain is kept sorted by
/// `(created_at, id)` on insert, so reads never sort.
#[derive(Debug)]
pub(crate) struct VersionIndex {
    next_id: AtomicU64,
    chains: RwLock<HashMap<ItemKey, Vec<Version>>>,
}

impl VersionIndex {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            chains: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn allocate_id(&self) -> VersionId {
        VersionId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Insert a version that already has an identity.
    pub(crate) fn insert(&self, version: Version) -> StoreResult<()> {
        // Keep allocation ahead of every identity seen, including loaded ones.
        self.next_id
            .fetch_max(version.id().value() + 1, Ordering::SeqCst);

        let mut chains = self.chains.write().map_err(|_| StoreError::poisoned())?;
        let chain = chains
            .entry((version.item_type().to_string(), version.item_id().to_string()))
            .or_default();
        let key = version.order_key();
        let pos = chain.partition_point(|v| v.order_key() <= key);
        chain.insert(pos, version);
        Ok(())
    }

    pub(crate) fn chain(&self, item_type: &str, item_id: &str) -> StoreResult<Vec<Version>> {
        let chains = self.chains.read().map_err(|_| StoreError::poisoned())?;
        Ok(chains
            .get(&(item_type.to_string(), item_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    pub(crate) fn first_after(
        &self,
        item_type: &str,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Version>> {
        let chains = self.chains.read().map_err(|_| StoreError::poisoned())?;
        Ok(chains
            .get(&(item_type.to_string(), item_id.to_string()))
            .and_then(|chain| chain.iter().find(|v| v.created_at() > at))
            .cloned())
    }

    pub(crate) fn last(&self, item_type: &str, item_id: &str) -> StoreResult<Option<Version>> {
        let chains = self.chains.read().map_err(|_| StoreError::poisoned())?;
        Ok(chains
            .get(&(item_type.to_string(), item_id.to_string()))
            .and_then(|chain| chain.last())
            .cloned())
    }

    /// (items, versions)
    pub(crate) fn counts(&self) -> (usize, usize) {
        self.chains
            .read()
            .map(|chains| (chains.len(), chains.values().map(Vec::len).sum()))
            .unwrap_or((0, 0))
    }
}

/// In-memory version store.
///
/// Not durable. Used when embedding the trail in tests or short-lived processes.
#[derive(Debug)]
pub struct MemoryVersionStore {
    index: VersionIndex,
    object_changes: bool,
}

impl Default for MemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVersionStore {
    /// Create an empty store that keeps changesets.
    pub fn new() -> Self {
        Self {
            index: VersionIndex::new(),
            object_changes: true,
        }
    }

    /// Create an empty store without a changeset column.
    pub fn without_object_changes() -> Self {
        Self {
            object_changes: false,
            ..Self::new()
        }
    }

    /// Number of distinct items with history.
    pub fn item_count(&self) -> usize {
        self.index.counts().0
    }

    /// Number of versions across all items.
    pub fn len(&self) -> usize {
        self.index.counts().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VersionStore for MemoryVersionStore {
    fn append(&self, mut draft: VersionDraft) -> StoreResult<Version> {
        if !self.object_changes {
            draft.object_changes = None;
        }
        let version = draft.into_version(self.index.allocate_id());
        self.index.insert(version.clone())?;
        Ok(version)
    }

    fn list_ordered(&self, item_type: &str, item_id: &str) -> StoreResult<Vec<Version>> {
        self.index.chain(item_type, item_id)
    }

    fn first_after(
        &self,
        item_type: &str,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Version>> {
        self.index.first_after(item_type, item_id, at)
    }

    fn last(&self, item_type: &str, item_id: &str) -> StoreResult<Option<Version>> {
        self.index.last(item_type, item_id)
    }

    fn supports_object_changes(&self) -> bool {
        self.object_changes
    }
}
