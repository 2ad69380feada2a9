//! Request Context
//!
//! Ambient information the host supplies at capture time: who is acting,
//! request-scoped metadata, and whether capture is on for this request.

use serde_json::Value;
use uuid::Uuid;

use crate::version::Metadata;

/// Supplies the acting party and ambient metadata for a capture.
pub trait ContextProvider {
    /// The actor to record as `whodunnit`.
    fn current_actor(&self) -> Option<String>;

    /// Extra columns applying to every version captured in this context.
    fn ambient_metadata(&self) -> Option<Metadata> {
        None
    }

    /// Whether capture is enabled for this request.
    fn is_capturing_enabled_for_context(&self) -> bool {
        true
    }
}

/// No actor, no metadata, capture enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl ContextProvider for NoContext {
    fn current_actor(&self) -> Option<String> {
        None
    }
}

/// Context carried through one unit of host work
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Acting party
    pub actor: Option<String>,

    /// Ambient metadata
    pub metadata: Metadata,

    /// Capture switch for this request
    pub capture_enabled: bool,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(actor: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor,
            metadata: Metadata::new(),
            capture_enabled: true,
        }
    }

    /// Create an anonymous context
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Create a context acting as `actor`
    pub fn for_actor(actor: impl Into<String>) -> Self {
        Self::new(Some(actor.into()))
    }

    /// Add ambient metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Record the request ID on every version as `request_id`
    pub fn with_request_id_metadata(self) -> Self {
        let id = self.request_id.to_string();
        self.with_metadata("request_id", Value::String(id))
    }

    /// Turn capture off for this request
    pub fn with_capture_disabled(mut self) -> Self {
        self.capture_enabled = false;
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl ContextProvider for RequestContext {
    fn current_actor(&self) -> Option<String> {
        self.actor.clone()
    }

    fn ambient_metadata(&self) -> Option<Metadata> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(self.metadata.clone())
        }
    }

    fn is_capturing_enabled_for_context(&self) -> bool {
        self.capture_enabled
    }
}
