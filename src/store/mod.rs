//! Version Record Store
//!
//! The store is an external collaborator. The engine needs only an
//! append-only, per-item ordered log:
//! - `append` assigns the version identity
//! - reads return versions ascending by `(created_at, id)`
//! - the engine never reorders, mutates or deletes versions
//!
//! Implementations:
//! - `MemoryVersionStore` - in-process, for embedding and tests
//! - `FileVersionStore` - append-only JSON-lines log with per-line CRC32

mod checksum;
mod errors;
mod file;
mod memory;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{StoreError, StoreResult};
pub use file::FileVersionStore;
pub use memory::MemoryVersionStore;

use chrono::{DateTime, Utc};

use crate::version::{Version, VersionDraft};

/// Append-only, per-item ordered version log.
pub trait VersionStore: Send + Sync {
    /// Persist a staged version and return it with its assigned identity.
    fn append(&self, draft: VersionDraft) -> StoreResult<Version>;

    /// All versions of one item, ascending by `(created_at, id)`.
    fn list_ordered(&self, item_type: &str, item_id: &str) -> StoreResult<Vec<Version>>;

    /// The first version of the item created strictly after `at`.
    fn first_after(
        &self,
        item_type: &str,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Version>>;

    /// The most recent version of the item.
    fn last(&self, item_type: &str, item_id: &str) -> StoreResult<Option<Version>>;

    /// Whether the store keeps the structured changeset column.
    fn supports_object_changes(&self) -> bool {
        true
    }

    /// The version immediately before `version` in its item's order.
    fn preceding(&self, version: &Version) -> StoreResult<Option<Version>> {
        let key = version.order_key();
        Ok(self
            .list_ordered(version.item_type(), version.item_id())?
            .into_iter()
            .take_while(|v| v.order_key() < key)
            .last())
    }

    /// The version immediately after `version` in its item's order.
    fn following(&self, version: &Version) -> StoreResult<Option<Version>> {
        let key = version.order_key();
        Ok(self
            .list_ordered(version.item_type(), version.item_id())?
            .into_iter()
            .find(|v| v.order_key() > key))
    }

    /// Versions of the item with `from <= created_at <= to`, ascending.
    fn between(
        &self,
        item_type: &str,
        item_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Version>> {
        Ok(self
            .list_ordered(item_type, item_id)?
            .into_iter()
            .filter(|v| v.created_at() >= from && v.created_at() <= to)
            .collect())
    }
}
