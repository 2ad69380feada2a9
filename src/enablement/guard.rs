//! Scoped suppression guard

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::ThreadId;

pub(crate) type SuppressionKey = (ThreadId, String);
pub(crate) type SuppressionSet = Arc<Mutex<HashSet<SuppressionKey>>>;

/// Suppresses capture for one model on the current thread while alive.
///
/// Dropping the guard restores the state that held when it was taken,
/// on normal exit and on unwind alike. An inner guard for a model that
/// is already suppressed leaves the outer suppression in place.
#[must_use = "suppression ends when the guard is dropped"]
pub struct SuppressionGuard {
    set: SuppressionSet,
    key: SuppressionKey,
    was_suppressed: bool,
}

impl SuppressionGuard {
    pub(crate) fn acquire(set: SuppressionSet, key: SuppressionKey) -> Self {
        let was_suppressed = !set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());

        Self {
            set,
            key,
            was_suppressed,
        }
    }

    /// The suppressed item type.
    pub fn item_type(&self) -> &str {
        &self.key.1
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        if !self.was_suppressed {
            self.set
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.key);
        }
    }
}
