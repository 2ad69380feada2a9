//! Version events
//!
//! - A version is a logically immutable record of one lifecycle event
//! - Versions of one item are totally ordered by `(created_at, id)`
//! - Once appended, a version never changes

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra metadata columns attached to a version.
pub type Metadata = BTreeMap<String, Value>;

/// A totally ordered, store-assigned version identity.
///
/// Two versions of the same item may share a timestamp; the id breaks
/// the tie so the history has no ambiguous positions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    /// Creates a new VersionId with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle event recorded by a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Item was created
    Create,
    /// Item was updated
    Update,
    /// Item was destroyed
    Destroy,
}

impl EventKind {
    /// All event kinds, in lifecycle order.
    pub const ALL: [EventKind; 3] = [EventKind::Create, EventKind::Update, EventKind::Destroy];

    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Destroy => "destroy",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A staged version: everything except the store-assigned identity.
///
/// Built by the capture pipeline before the store is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDraft {
    pub item_type: String,
    pub item_id: String,
    pub event: EventKind,
    pub created_at: DateTime<Utc>,
    /// Encoded prior state. Absent for `create`.
    pub object: Option<String>,
    /// Encoded `{attribute: [before, after]}` pairs.
    pub object_changes: Option<String>,
    pub whodunnit: Option<String>,
    pub metadata: Metadata,
}

impl VersionDraft {
    /// Seals the draft with the identity assigned by the store.
    pub fn into_version(self, id: VersionId) -> Version {
        Version {
            id,
            item_type: self.item_type,
            item_id: self.item_id,
            event: self.event,
            created_at: self.created_at,
            object: self.object,
            object_changes: self.object_changes,
            whodunnit: self.whodunnit,
            metadata: self.metadata,
        }
    }
}

/// A single immutable version event.
///
/// All fields are private to enforce immutability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    id: VersionId,
    item_type: String,
    item_id: String,
    event: EventKind,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object_changes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    whodunnit: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: Metadata,
}

impl Version {
    #[inline]
    pub fn id(&self) -> VersionId {
        self.id
    }

    #[inline]
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    #[inline]
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    #[inline]
    pub fn event(&self) -> EventKind {
        self.event
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The encoded state of the item before this event.
    #[inline]
    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// The encoded changeset, if the store recorded one.
    #[inline]
    pub fn object_changes(&self) -> Option<&str> {
        self.object_changes.as_deref()
    }

    /// The actor responsible for this event.
    #[inline]
    pub fn whodunnit(&self) -> Option<&str> {
        self.whodunnit.as_deref()
    }

    /// The actor who ended the state stored in this version.
    ///
    /// Same value as `whodunnit`; named for reading history backwards.
    #[inline]
    pub fn terminator(&self) -> Option<&str> {
        self.whodunnit()
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Position of this version in the total order of its item.
    #[inline]
    pub fn order_key(&self) -> (DateTime<Utc>, VersionId) {
        (self.created_at, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(event: EventKind, secs: i64) -> VersionDraft {
        VersionDraft {
            item_type: "Widget".to_string(),
            item_id: "1".to_string(),
            event,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            object: None,
            object_changes: None,
            whodunnit: Some("alice".to_string()),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_into_version_keeps_fields() {
        let version = draft(EventKind::Update, 10).into_version(VersionId::new(7));

        assert_eq!(version.id(), VersionId::new(7));
        assert_eq!(version.item_type(), "Widget");
        assert_eq!(version.event(), EventKind::Update);
        assert_eq!(version.whodunnit(), Some("alice"));
        assert_eq!(version.terminator(), Some("alice"));
    }

    #[test]
    fn test_order_key_breaks_timestamp_ties_by_id() {
        let a = draft(EventKind::Update, 10).into_version(VersionId::new(2));
        let b = draft(EventKind::Update, 10).into_version(VersionId::new(3));
        let c = draft(EventKind::Update, 9).into_version(VersionId::new(9));

        assert!(a.order_key() < b.order_key());
        assert!(c.order_key() < a.order_key());
    }

    #[test]
    fn test_event_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EventKind::Destroy).unwrap();
        assert_eq!(json, "\"destroy\"");
        assert_eq!(EventKind::Create.to_string(), "create");
    }

    #[test]
    fn test_version_json_omits_absent_payloads() {
        let version = draft(EventKind::Create, 1).into_version(VersionId::new(1));
        let json = serde_json::to_string(&version).unwrap();

        assert!(!json.contains("\"object\""));
        assert!(!json.contains("metadata"));

        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, version);
    }
}
