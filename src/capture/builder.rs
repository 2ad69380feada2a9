//! Version Builder
//!
//! Turns a lifecycle event on a record into a staged version:
//! - create: no prior state, changeset of the initial attributes
//! - update: prior state, changeset of the notable attributes
//! - destroy: full snapshot of the record as it stands, no changeset
//!
//! The builder is pure. Gating, storage and logging belong to the trail.

use std::collections::BTreeSet;

use chrono::Utc;

use super::detector::ChangeDetector;
use super::metadata::MetadataMerger;
use super::shadow::ShadowBuilder;
use crate::model::{ModelConfig, Record};
use crate::version::{CodecResult, EventKind, Metadata, ObjectCodec, VersionDraft};

/// Who made a change and the ambient metadata around it.
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub whodunnit: Option<String>,
    pub metadata: Option<Metadata>,
}

impl Attribution {
    pub fn new(whodunnit: Option<String>, metadata: Option<Metadata>) -> Self {
        Self { whodunnit, metadata }
    }
}

/// Builds staged versions for one codec.
pub struct VersionBuilder<'a> {
    codec: &'a dyn ObjectCodec,
    track_changes: bool,
}

impl<'a> VersionBuilder<'a> {
    /// `track_changes` controls whether changesets are encoded at all.
    pub fn new(codec: &'a dyn ObjectCodec, track_changes: bool) -> Self {
        Self {
            codec,
            track_changes,
        }
    }

    /// Version for a newly created record.
    pub fn create(
        &self,
        config: &ModelConfig,
        record: &Record,
        attribution: &Attribution,
    ) -> CodecResult<VersionDraft> {
        let notable = ChangeDetector::notable_changes(record.changed(), config.filters());
        let object_changes = self.encode_changeset(record, &notable)?;

        Ok(self.draft(config, record, EventKind::Create, None, object_changes, attribution))
    }

    /// Version for an update, or `None` if no notable attribute changed.
    pub fn update(
        &self,
        config: &ModelConfig,
        record: &Record,
        attribution: &Attribution,
    ) -> CodecResult<Option<VersionDraft>> {
        if !ChangeDetector::is_notable(record.changed(), config.filters()) {
            return Ok(None);
        }
        self.forced_update(config, record, attribution).map(Some)
    }

    /// Version for an update regardless of what changed.
    pub fn forced_update(
        &self,
        config: &ModelConfig,
        record: &Record,
        attribution: &Attribution,
    ) -> CodecResult<VersionDraft> {
        let filters = config.filters();
        let prior =
            ShadowBuilder::prior_state(record.attributes(), record.before_values(), &filters.skip);
        let object = self.codec.encode_object(&prior)?;

        let notable = ChangeDetector::notable_changes(record.changed(), filters);
        let object_changes = self.encode_changeset(record, &notable)?;

        Ok(self.draft(
            config,
            record,
            EventKind::Update,
            Some(object),
            object_changes,
            attribution,
        ))
    }

    /// Version for a destroyed record.
    pub fn destroy(
        &self,
        config: &ModelConfig,
        record: &Record,
        attribution: &Attribution,
    ) -> CodecResult<VersionDraft> {
        let snapshot = ShadowBuilder::snapshot(record.attributes(), &config.filters().skip);
        let object = self.codec.encode_object(&snapshot)?;

        Ok(self.draft(config, record, EventKind::Destroy, Some(object), None, attribution))
    }

    fn encode_changeset(
        &self,
        record: &Record,
        notable: &BTreeSet<String>,
    ) -> CodecResult<Option<String>> {
        if !self.track_changes || notable.is_empty() {
            return Ok(None);
        }
        let changes = ShadowBuilder::changeset(record, notable);
        self.codec.encode_changes(&changes).map(Some)
    }

    fn draft(
        &self,
        config: &ModelConfig,
        record: &Record,
        event: EventKind,
        object: Option<String>,
        object_changes: Option<String>,
        attribution: &Attribution,
    ) -> VersionDraft {
        VersionDraft {
            item_type: config.item_type().to_string(),
            item_id: record.id().to_string(),
            event,
            created_at: Utc::now(),
            object,
            object_changes,
            whodunnit: attribution.whodunnit.clone(),
            metadata: MetadataMerger::merge(config, record, attribution.metadata.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::JsonCodec;
    use serde_json::json;

    fn persisted_widget() -> Record {
        let mut record = Record::new("Widget", "7")
            .with_attribute("name", "A")
            .with_attribute("secret", "s")
            .with_attribute("updated_at", "t1");
        record.mark_persisted();
        record
    }

    fn config() -> ModelConfig {
        ModelConfig::builder("Widget")
            .ignore(["updated_at"])
            .skip(["secret"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_has_no_object() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, true);
        let record = Record::new("Widget", "7").with_attribute("name", "A");

        let draft = builder
            .create(&config(), &record, &Attribution::new(Some("alice".into()), None))
            .unwrap();

        assert_eq!(draft.event, EventKind::Create);
        assert_eq!(draft.object, None);
        assert_eq!(draft.whodunnit.as_deref(), Some("alice"));

        let changes = codec.decode_changes(draft.object_changes.as_deref().unwrap()).unwrap();
        assert_eq!(changes["name"], (json!(null), json!("A")));
    }

    #[test]
    fn test_update_stores_prior_state() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, true);
        let mut record = persisted_widget();
        record.set("name", "B");
        record.set("updated_at", "t2");

        let draft = builder
            .update(&config(), &record, &Attribution::default())
            .unwrap()
            .unwrap();

        let object = codec.decode_object(draft.object.as_deref().unwrap()).unwrap();
        assert_eq!(object["name"], json!("A"));
        assert_eq!(object["updated_at"], json!("t1"));
        assert!(!object.contains_key("secret"));

        let changes = codec.decode_changes(draft.object_changes.as_deref().unwrap()).unwrap();
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_update_of_ignored_only_is_skipped() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, true);
        let mut record = persisted_widget();
        record.set("updated_at", "t2");
        record.set("secret", "s2");

        let draft = builder.update(&config(), &record, &Attribution::default()).unwrap();
        assert!(draft.is_none());
    }

    #[test]
    fn test_forced_update_without_changes() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, true);
        let record = persisted_widget();

        let draft = builder
            .forced_update(&config(), &record, &Attribution::default())
            .unwrap();

        assert_eq!(draft.event, EventKind::Update);
        assert!(draft.object.is_some());
        assert_eq!(draft.object_changes, None);
    }

    #[test]
    fn test_destroy_snapshots_current_state() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, true);
        let record = persisted_widget();

        let draft = builder.destroy(&config(), &record, &Attribution::default()).unwrap();

        let object = codec.decode_object(draft.object.as_deref().unwrap()).unwrap();
        assert_eq!(object["name"], json!("A"));
        assert!(!object.contains_key("secret"));
        assert_eq!(draft.object_changes, None);
    }

    #[test]
    fn test_changes_not_tracked() {
        let codec = JsonCodec;
        let builder = VersionBuilder::new(&codec, false);
        let mut record = persisted_widget();
        record.set("name", "B");

        let draft = builder
            .update(&config(), &record, &Attribution::default())
            .unwrap()
            .unwrap();
        assert_eq!(draft.object_changes, None);
    }
}
