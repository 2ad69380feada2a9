//! Enablement Controller
//!
//! Capture for a model happens only when all of these hold:
//! 1. the trail is globally enabled
//! 2. the request context has capture on
//! 3. the model is enabled
//! 4. the model is not suppressed on the current thread
//!
//! Global and per-model switches are visible to every thread.
//! Suppression is thread-scoped and always restored.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

use super::guard::{SuppressionGuard, SuppressionSet};
use crate::observability::{log_event, log_event_with_fields, Event};

/// Outcome of the capture gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    GloballyDisabled,
    ContextDisabled,
    ModelDisabled,
    Suppressed,
}

impl Gate {
    pub fn is_open(&self) -> bool {
        matches!(self, Gate::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Open => "open",
            Gate::GloballyDisabled => "globally_disabled",
            Gate::ContextDisabled => "context_disabled",
            Gate::ModelDisabled => "model_disabled",
            Gate::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global, per-model and scoped capture switches.
pub struct Enablement {
    enabled: AtomicBool,
    models: RwLock<HashMap<String, Arc<AtomicBool>>>,
    suppressed: SuppressionSet,
}

impl Default for Enablement {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Enablement {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            models: RwLock::new(HashMap::new()),
            suppressed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Switch capture on or off for every model.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        log_event(if enabled {
            Event::TrailEnabled
        } else {
            Event::TrailDisabled
        });
    }

    /// Track the switch of a newly registered model.
    pub fn register_model(&self, item_type: &str, enabled: bool) {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item_type.to_string(), Arc::new(AtomicBool::new(enabled)));
    }

    /// Switch capture for one model. Returns false if the model is unknown.
    pub fn set_model_enabled(&self, item_type: &str, enabled: bool) -> bool {
        let flag = match self.model_flag(item_type) {
            Some(flag) => flag,
            None => return false,
        };
        flag.store(enabled, Ordering::SeqCst);

        let event = if enabled {
            Event::ModelEnabled
        } else {
            Event::ModelDisabled
        };
        log_event_with_fields(event, &[("item_type", item_type)]);
        true
    }

    /// Per-model switch. Unknown models read as enabled.
    pub fn is_model_enabled(&self, item_type: &str) -> bool {
        self.model_flag(item_type)
            .map_or(true, |flag| flag.load(Ordering::SeqCst))
    }

    /// Returns true if `item_type` is suppressed on the current thread.
    pub fn is_suppressed(&self, item_type: &str) -> bool {
        let key = (thread::current().id(), item_type.to_string());
        self.suppressed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    /// Suppress capture for `item_type` on this thread until the guard drops.
    pub fn suppress(&self, item_type: &str) -> SuppressionGuard {
        SuppressionGuard::acquire(
            Arc::clone(&self.suppressed),
            (thread::current().id(), item_type.to_string()),
        )
    }

    /// Run `op` with capture suppressed for `item_type` on this thread.
    pub fn without_versioning<F, R>(&self, item_type: &str, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.suppress(item_type);
        op()
    }

    /// Evaluate every switch for a capture of `item_type`.
    pub fn gate(&self, item_type: &str, context_enabled: bool) -> Gate {
        if !self.is_enabled() {
            Gate::GloballyDisabled
        } else if !context_enabled {
            Gate::ContextDisabled
        } else if !self.is_model_enabled(item_type) {
            Gate::ModelDisabled
        } else if self.is_suppressed(item_type) {
            Gate::Suppressed
        } else {
            Gate::Open
        }
    }

    fn model_flag(&self, item_type: &str) -> Option<Arc<AtomicBool>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(item_type)
            .cloned()
    }
}
