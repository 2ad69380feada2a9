//! Observable events
//!
//! Every log line the engine writes names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Control plane
    /// Model registered for versioning
    ModelRegistered,
    /// Versioning switched on process-wide
    TrailEnabled,
    /// Versioning switched off process-wide
    TrailDisabled,
    /// Versioning switched on for one model
    ModelEnabled,
    /// Versioning switched off for one model
    ModelDisabled,

    // Capture
    /// Version appended to the store
    VersionCaptured,
    /// Mutation had no notable changes
    CaptureSkipped,
    /// Capture gated off (global, context, model or scoped suppression)
    CaptureSuppressed,
    /// Store rejected or failed the append
    CaptureFailed,

    // Reification
    /// Stored payload could not be turned back into a record
    ReifyFailed,

    // Store
    /// Version log opened and indexed
    StoreOpened,
    /// Version log failed checksum or parse (FATAL)
    StoreCorruption,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ModelRegistered => "MODEL_REGISTERED",
            Event::TrailEnabled => "TRAIL_ENABLED",
            Event::TrailDisabled => "TRAIL_DISABLED",
            Event::ModelEnabled => "MODEL_ENABLED",
            Event::ModelDisabled => "MODEL_DISABLED",
            Event::VersionCaptured => "VERSION_CAPTURED",
            Event::CaptureSkipped => "CAPTURE_SKIPPED",
            Event::CaptureSuppressed => "CAPTURE_SUPPRESSED",
            Event::CaptureFailed => "CAPTURE_FAILED",
            Event::ReifyFailed => "REIFY_FAILED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreCorruption => "STORE_CORRUPTION",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::VersionCaptured | Event::CaptureSkipped | Event::CaptureSuppressed => {
                Severity::Trace
            }
            Event::ModelRegistered
            | Event::TrailEnabled
            | Event::TrailDisabled
            | Event::ModelEnabled
            | Event::ModelDisabled
            | Event::StoreOpened => Severity::Info,
            Event::ReifyFailed => Severity::Warn,
            Event::CaptureFailed => Severity::Error,
            Event::StoreCorruption => Severity::Fatal,
        }
    }

    /// Returns true if this event indicates data the trail cannot trust
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
