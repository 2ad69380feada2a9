//! Per-model versioning configuration
//!
//! Built once when a model is registered and immutable afterwards.
//! Validation happens in `ModelConfigBuilder::build`, so a model that
//! registers successfully can never fail on configuration at mutation time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::errors::{ConfigError, ConfigResult};
use super::record::Record;
use crate::version::EventKind;

/// Version columns that metadata keys may not shadow.
pub const RESERVED_COLUMNS: [&str; 9] = [
    "id",
    "item_type",
    "item_id",
    "event",
    "created_at",
    "object",
    "object_changes",
    "whodunnit",
    "metadata",
];

/// A function computing a value from a record.
pub type ComputedFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// How an extra metadata column gets its value.
#[derive(Clone)]
pub enum MetadataRule {
    /// A fixed value.
    Literal(Value),
    /// A function of the record.
    Computed(ComputedFn),
    /// A named accessor: a registered accessor of the model, else the attribute of that name.
    Accessor(String),
}

impl MetadataRule {
    /// Convenience constructor for `Computed`.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        MetadataRule::Computed(Arc::new(f))
    }

    /// Convenience constructor for `Accessor`.
    pub fn accessor(name: impl Into<String>) -> Self {
        MetadataRule::Accessor(name.into())
    }
}

impl fmt::Debug for MetadataRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataRule::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            MetadataRule::Computed(_) => f.write_str("Computed(..)"),
            MetadataRule::Accessor(name) => f.debug_tuple("Accessor").field(name).finish(),
        }
    }
}

/// Attribute filters consulted by the change detector.
///
/// - `ignore`: excluded from change detection, still serialized
/// - `skip`: excluded from change detection and from serialization
/// - `only`: if non-empty, only these attributes make a change notable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilters {
    pub ignore: BTreeSet<String>,
    pub only: BTreeSet<String>,
    pub skip: BTreeSet<String>,
}

/// A `has_one` association whose child is itself a tracked model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    name: String,
    item_type: String,
}

impl Association {
    pub fn new(name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item type of the associated child.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }
}

/// Versioning configuration of one model.
#[derive(Clone)]
pub struct ModelConfig {
    item_type: String,
    on: BTreeSet<EventKind>,
    filters: AttributeFilters,
    meta: BTreeMap<String, MetadataRule>,
    accessors: BTreeMap<String, ComputedFn>,
    has_one: Vec<Association>,
    enabled: bool,
}

impl ModelConfig {
    /// Start configuring a model.
    pub fn builder(item_type: impl Into<String>) -> ModelConfigBuilder {
        ModelConfigBuilder::new(item_type)
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Returns true if versions are recorded for `event`.
    pub fn tracks(&self, event: EventKind) -> bool {
        self.on.contains(&event)
    }

    pub fn filters(&self) -> &AttributeFilters {
        &self.filters
    }

    pub fn meta(&self) -> &BTreeMap<String, MetadataRule> {
        &self.meta
    }

    /// Looks up a registered accessor.
    pub fn accessor(&self, name: &str) -> Option<&ComputedFn> {
        self.accessors.get(name)
    }

    pub fn has_one(&self) -> &[Association] {
        &self.has_one
    }

    /// Whether versioning starts out enabled for this model.
    pub fn initially_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("item_type", &self.item_type)
            .field("on", &self.on)
            .field("filters", &self.filters)
            .field("meta", &self.meta)
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .field("has_one", &self.has_one)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Builder for `ModelConfig`.
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    fn new(item_type: impl Into<String>) -> Self {
        Self {
            config: ModelConfig {
                item_type: item_type.into(),
                on: EventKind::ALL.into_iter().collect(),
                filters: AttributeFilters::default(),
                meta: BTreeMap::new(),
                accessors: BTreeMap::new(),
                has_one: Vec::new(),
                enabled: true,
            },
        }
    }

    /// Restrict the tracked lifecycle events. Defaults to all three.
    pub fn on<I>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = EventKind>,
    {
        self.config.on = events.into_iter().collect();
        self
    }

    /// Attributes whose changes alone never produce a version.
    pub fn ignore<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters.ignore.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Attributes that alone can produce a version.
    pub fn only<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters.only.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Attributes neither compared nor stored.
    pub fn skip<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters.skip.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Add an extra metadata column.
    pub fn meta(mut self, column: impl Into<String>, rule: MetadataRule) -> Self {
        self.config.meta.insert(column.into(), rule);
        self
    }

    /// Register a named accessor usable from `MetadataRule::Accessor`.
    pub fn accessor<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.config.accessors.insert(name.into(), Arc::new(f));
        self
    }

    /// Declare a `has_one` association to another tracked model.
    pub fn has_one(mut self, name: impl Into<String>, item_type: impl Into<String>) -> Self {
        self.config.has_one.push(Association::new(name, item_type));
        self
    }

    /// Start with versioning switched off for this model.
    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> ConfigResult<ModelConfig> {
        let config = self.config;

        if config.item_type.trim().is_empty() {
            return Err(ConfigError::EmptyItemType);
        }

        let filters = &config.filters;
        for (set_name, set) in [
            ("ignore", &filters.ignore),
            ("only", &filters.only),
            ("skip", &filters.skip),
        ] {
            if set.iter().any(|a| a.trim().is_empty()) {
                return Err(ConfigError::EmptyAttributeName(set_name));
            }
        }

        // `ignore` and `skip` apply before `only`. If nothing in `only`
        // survives them, updates could never be recorded.
        if !filters.only.is_empty()
            && filters
                .only
                .iter()
                .all(|a| filters.ignore.contains(a) || filters.skip.contains(a))
        {
            return Err(ConfigError::UnreachableOnly {
                item_type: config.item_type.clone(),
                attributes: filters.only.iter().cloned().collect(),
            });
        }

        for column in config.meta.keys() {
            if column.trim().is_empty() {
                return Err(ConfigError::EmptyMetadataKey);
            }
            if RESERVED_COLUMNS.contains(&column.as_str()) {
                return Err(ConfigError::ReservedMetadataKey(column.clone()));
            }
        }

        let mut seen = BTreeSet::new();
        for assoc in &config.has_one {
            if !seen.insert(assoc.name()) {
                return Err(ConfigError::DuplicateAssociation(assoc.name().to_string()));
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_track_all_events() {
        let config = ModelConfig::builder("Widget").build().unwrap();

        assert!(config.tracks(EventKind::Create));
        assert!(config.tracks(EventKind::Update));
        assert!(config.tracks(EventKind::Destroy));
        assert!(config.initially_enabled());
    }

    #[test]
    fn test_on_restricts_events() {
        let config = ModelConfig::builder("Widget")
            .on([EventKind::Update])
            .build()
            .unwrap();

        assert!(!config.tracks(EventKind::Create));
        assert!(config.tracks(EventKind::Update));
    }

    #[test]
    fn test_empty_item_type_rejected() {
        let err = ModelConfig::builder("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyItemType);
    }

    #[test]
    fn test_only_fully_ignored_rejected() {
        let err = ModelConfig::builder("Widget")
            .only(["name"])
            .ignore(["name"])
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::UnreachableOnly { .. }));
    }

    #[test]
    fn test_only_partially_ignored_accepted() {
        let config = ModelConfig::builder("Widget")
            .only(["name", "color"])
            .ignore(["name"])
            .build()
            .unwrap();

        assert_eq!(config.filters().only.len(), 2);
    }

    #[test]
    fn test_reserved_metadata_key_rejected() {
        let err = ModelConfig::builder("Widget")
            .meta("whodunnit", MetadataRule::Literal(json!("x")))
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::ReservedMetadataKey("whodunnit".to_string()));
    }

    #[test]
    fn test_empty_attribute_name_rejected() {
        let err = ModelConfig::builder("Widget").skip([""]).build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyAttributeName("skip"));
    }

    #[test]
    fn test_duplicate_association_rejected() {
        let err = ModelConfig::builder("Widget")
            .has_one("wotsit", "Wotsit")
            .has_one("wotsit", "Wotsit")
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::DuplicateAssociation("wotsit".to_string()));
    }

    #[test]
    fn test_metadata_rule_debug_hides_closures() {
        let rule = MetadataRule::computed(|_| json!(1));
        assert_eq!(format!("{:?}", rule), "Computed(..)");
    }
}
