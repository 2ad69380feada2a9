//! Trackable records
//!
//! A `Record` is the engine's view of a host entity: item type, identity,
//! attribute values, and the before-values of attributes changed since
//! the record was last persisted.
//!
//! A record with a source version is a reification. A record without one
//! is the live object.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::version::{Changeset, Version};

/// Attribute values by name.
pub type Attributes = BTreeMap<String, Value>;

/// A trackable record: live, or reified from a version.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    item_type: String,
    id: String,
    attributes: Attributes,
    /// Before-values of dirty attributes. Absent attributes read as null.
    original: Attributes,
    /// Whether the host has saved this record at least once.
    persisted: bool,
    /// The version this record was reified from. None for the live object.
    version: Option<Version>,
    /// Reified `has_one` associations. `None` means the child did not exist.
    associations: BTreeMap<String, Option<Record>>,
}

impl Record {
    /// Creates a new, unsaved record with no attributes.
    pub fn new(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            id: id.into(),
            attributes: Attributes::new(),
            original: Attributes::new(),
            persisted: false,
            version: None,
            associations: BTreeMap::new(),
        }
    }

    /// Creates a record as loaded from the primary store: no dirty attributes.
    pub fn from_persisted(
        item_type: impl Into<String>,
        id: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            attributes,
            persisted: true,
            ..Self::new(item_type, id)
        }
    }

    /// Creates a reification of `version` carrying `attributes`.
    pub(crate) fn reified(version: &Version, attributes: Attributes) -> Self {
        Self {
            item_type: version.item_type().to_string(),
            id: version.item_id().to_string(),
            attributes,
            original: Attributes::new(),
            persisted: true,
            version: Some(version.clone()),
            associations: BTreeMap::new(),
        }
    }

    /// Builder form of `set`.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Writes an attribute, tracking its before-value.
    ///
    /// Writing an attribute back to its before-value clears it from the
    /// dirty set.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let current = self.attributes.get(&name).cloned().unwrap_or(Value::Null);

        match self.original.get(&name) {
            Some(before) if *before == value => {
                self.original.remove(&name);
            }
            Some(_) => {}
            None if current != value => {
                self.original.insert(name.clone(), current);
            }
            None => {}
        }

        self.attributes.insert(name, value);
    }

    /// Names of attributes changed since last persisted.
    pub fn changed(&self) -> Vec<&str> {
        self.original.keys().map(String::as_str).collect()
    }

    /// Returns true if any attribute changed since last persisted.
    pub fn is_changed(&self) -> bool {
        !self.original.is_empty()
    }

    /// Before-values of the changed attributes.
    pub fn before_values(&self) -> &Attributes {
        &self.original
    }

    /// `{attribute: (before, after)}` for every changed attribute.
    pub fn changes(&self) -> Changeset {
        self.original
            .iter()
            .map(|(name, before)| {
                let after = self.attributes.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), (before.clone(), after))
            })
            .collect()
    }

    /// Forgets dirty state, as the host does once the record is saved.
    pub fn mark_persisted(&mut self) {
        self.original.clear();
        self.persisted = true;
    }

    /// Returns true once the record has been saved or loaded.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// The version this record was reified from.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Returns true if this is the live object, not a reification.
    pub fn is_live(&self) -> bool {
        self.version.is_none()
    }

    /// Reified `has_one` associations.
    pub fn associations(&self) -> &BTreeMap<String, Option<Record>> {
        &self.associations
    }

    /// A reified association: `None` if it was not reified or did not exist.
    pub fn association(&self, name: &str) -> Option<&Record> {
        self.associations.get(name).and_then(Option::as_ref)
    }

    pub(crate) fn attach_association(&mut self, name: impl Into<String>, child: Option<Record>) {
        self.associations.insert(name.into(), child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_tracks_initial_attributes_as_changes() {
        let record = Record::new("Widget", "1").with_attribute("name", "A");

        assert_eq!(record.changed(), vec!["name"]);
        assert_eq!(record.before_values()["name"], Value::Null);
        assert!(record.is_live());
        assert!(!record.is_persisted());
    }

    #[test]
    fn test_persisted_record_is_clean() {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), json!("A"));
        let record = Record::from_persisted("Widget", "1", attrs);

        assert!(!record.is_changed());
        assert!(record.is_persisted());
        assert_eq!(record.get("name"), Some(&json!("A")));
    }

    #[test]
    fn test_set_keeps_first_before_value() {
        let mut record = Record::new("Widget", "1").with_attribute("name", "A");
        record.mark_persisted();

        record.set("name", "B");
        record.set("name", "C");

        let changes = record.changes();
        assert_eq!(changes["name"], (json!("A"), json!("C")));
    }

    #[test]
    fn test_set_back_to_original_clears_dirty_state() {
        let mut record = Record::new("Widget", "1").with_attribute("name", "A");
        record.mark_persisted();

        record.set("name", "B");
        record.set("name", "A");

        assert!(!record.is_changed());
    }

    #[test]
    fn test_set_same_value_is_not_a_change() {
        let mut record = Record::new("Widget", "1").with_attribute("name", "A");
        record.mark_persisted();
        record.set("name", "A");

        assert!(record.changed().is_empty());
    }
}
