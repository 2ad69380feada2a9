//! Trail metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the trail is constructed

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::version::EventKind;

/// Operational counters of one trail.
///
/// Relaxed ordering: counters are independent and only read for reporting.
#[derive(Debug, Default)]
pub struct TrailMetrics {
    creates_captured: AtomicU64,
    updates_captured: AtomicU64,
    destroys_captured: AtomicU64,
    captures_skipped: AtomicU64,
    captures_suppressed: AtomicU64,
    capture_failures: AtomicU64,
    reifications: AtomicU64,
    reify_failures: AtomicU64,
}

impl TrailMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an appended version of the given kind.
    pub fn record_captured(&self, event: EventKind) {
        let counter = match event {
            EventKind::Create => &self.creates_captured,
            EventKind::Update => &self.updates_captured,
            EventKind::Destroy => &self.destroys_captured,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.captures_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed(&self) {
        self.captures_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reified(&self) {
        self.reifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reify_failure(&self) {
        self.reify_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Total versions appended, all kinds.
    pub fn versions_captured(&self) -> u64 {
        self.creates_captured.load(Ordering::Relaxed)
            + self.updates_captured.load(Ordering::Relaxed)
            + self.destroys_captured.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            creates_captured: self.creates_captured.load(Ordering::Relaxed),
            updates_captured: self.updates_captured.load(Ordering::Relaxed),
            destroys_captured: self.destroys_captured.load(Ordering::Relaxed),
            captures_skipped: self.captures_skipped.load(Ordering::Relaxed),
            captures_suppressed: self.captures_suppressed.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            reifications: self.reifications.load(Ordering::Relaxed),
            reify_failures: self.reify_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub creates_captured: u64,
    pub updates_captured: u64,
    pub destroys_captured: u64,
    pub captures_skipped: u64,
    pub captures_suppressed: u64,
    pub capture_failures: u64,
    pub reifications: u64,
    pub reify_failures: u64,
}

impl MetricsSnapshot {
    /// Serialize as a single JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
