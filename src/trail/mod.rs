//! Trail
//!
//! The entry point hosts talk to. A `Trail` owns the model registry, the
//! enablement switches and the metrics, and drives the capture pipeline
//! against a `VersionStore`.
//!
//! # Lifecycle hooks
//!
//! | Hook             | When the host calls it             | Version object         |
//! |------------------|------------------------------------|------------------------|
//! | `after_create`   | after the record is first saved    | none                   |
//! | `before_update`  | before an update is saved          | prior state            |
//! | `after_destroy`  | after the record is deleted        | full snapshot          |
//!
//! Each hook returns the appended version, `Ok(None)` when nothing was
//! recorded (untracked event, closed gate, non-notable update), or an
//! error. Store failures always propagate: the host decides whether the
//! primary write proceeds.

mod config;
mod errors;

pub use config::{TrailConfig, MAX_HAS_ONE_LOOKBACK_SECS};
pub use errors::{TrailError, TrailResult};

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::capture::{Attribution, VersionBuilder};
use crate::context::ContextProvider;
use crate::enablement::{Enablement, SuppressionGuard};
use crate::model::{ModelConfig, ModelRegistry, Record};
use crate::observability::{log_event_with_fields, Event, Logger, TrailMetrics};
use crate::reify::{
    AssociationResolver, Navigator, NoAssociations, ReifyError, ReifyOptions, ReifyResult, Reifier,
};
use crate::store::VersionStore;
use crate::version::{Changeset, EventKind, JsonCodec, ObjectCodec, Version};

/// Audit trail over one version store.
pub struct Trail {
    config: TrailConfig,
    store: Arc<dyn VersionStore>,
    codec: Arc<dyn ObjectCodec>,
    reifier: Reifier,
    registry: ModelRegistry,
    enablement: Enablement,
    resolver: Arc<dyn AssociationResolver>,
    metrics: TrailMetrics,
}

impl Trail {
    /// A trail with default configuration and the JSON codec.
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        let codec: Arc<dyn ObjectCodec> = Arc::new(JsonCodec);
        let config = TrailConfig::default();

        Self {
            enablement: Enablement::new(config.enabled),
            reifier: Reifier::new(Arc::clone(&codec)),
            config,
            store,
            codec,
            registry: ModelRegistry::new(),
            resolver: Arc::new(NoAssociations),
            metrics: TrailMetrics::new(),
        }
    }

    /// A trail with validated configuration. Applies the configured log level.
    pub fn with_config(store: Arc<dyn VersionStore>, config: TrailConfig) -> TrailResult<Self> {
        config.validate()?;
        Logger::set_min_severity(config.severity()?);

        let mut trail = Self::new(store);
        trail.enablement = Enablement::new(config.enabled);
        trail.config = config;
        Ok(trail)
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: Arc<dyn ObjectCodec>) -> Self {
        self.reifier = Reifier::new(Arc::clone(&codec));
        self.codec = codec;
        self
    }

    /// Install the host's `has_one` child lookup.
    pub fn with_association_resolver(mut self, resolver: Arc<dyn AssociationResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TrailMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Register a model. Each item type registers once.
    pub fn register(&self, model: ModelConfig) -> TrailResult<()> {
        let model = self.registry.register(model)?;
        self.enablement
            .register_model(model.item_type(), model.initially_enabled());

        log_event_with_fields(
            Event::ModelRegistered,
            &[
                ("codec", self.codec.name()),
                ("item_type", model.item_type()),
            ],
        );
        Ok(())
    }

    // ==================
    // Enablement
    // ==================

    pub fn is_enabled(&self) -> bool {
        self.enablement.is_enabled()
    }

    /// Switch capture on or off for every model.
    pub fn set_enabled(&self, enabled: bool) {
        self.enablement.set_enabled(enabled);
    }

    pub fn enable_model(&self, item_type: &str) -> TrailResult<()> {
        self.set_model_enabled(item_type, true)
    }

    pub fn disable_model(&self, item_type: &str) -> TrailResult<()> {
        self.set_model_enabled(item_type, false)
    }

    pub fn is_model_enabled(&self, item_type: &str) -> bool {
        self.enablement.is_model_enabled(item_type)
    }

    /// Run `op` without capturing versions of `item_type` on this thread.
    pub fn without_versioning<F, R>(&self, item_type: &str, op: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.enablement.without_versioning(item_type, op)
    }

    /// Suppress capture of `item_type` on this thread until the guard drops.
    pub fn suppress(&self, item_type: &str) -> SuppressionGuard {
        self.enablement.suppress(item_type)
    }

    fn set_model_enabled(&self, item_type: &str, enabled: bool) -> TrailResult<()> {
        if self.enablement.set_model_enabled(item_type, enabled) {
            Ok(())
        } else {
            Err(TrailError::UnknownModel(item_type.to_string()))
        }
    }

    // ==================
    // Lifecycle hooks
    // ==================

    /// Record the creation of `record`. Call with the record's changes still pending.
    pub fn after_create(
        &self,
        record: &Record,
        ctx: &dyn ContextProvider,
    ) -> TrailResult<Option<Version>> {
        self.capture(EventKind::Create, record, ctx, false)
    }

    /// Record the prior state of `record` before its pending update is saved.
    pub fn before_update(
        &self,
        record: &Record,
        ctx: &dyn ContextProvider,
    ) -> TrailResult<Option<Version>> {
        self.capture(EventKind::Update, record, ctx, false)
    }

    /// Record the destruction of `record`.
    pub fn after_destroy(
        &self,
        record: &Record,
        ctx: &dyn ContextProvider,
    ) -> TrailResult<Option<Version>> {
        self.capture(EventKind::Destroy, record, ctx, false)
    }

    /// Record an update version even if no notable attribute changed.
    pub fn touch_with_version(
        &self,
        record: &Record,
        ctx: &dyn ContextProvider,
    ) -> TrailResult<Option<Version>> {
        self.capture(EventKind::Update, record, ctx, true)
    }

    fn capture(
        &self,
        event: EventKind,
        record: &Record,
        ctx: &dyn ContextProvider,
        force: bool,
    ) -> TrailResult<Option<Version>> {
        let model = self
            .registry
            .get(record.item_type())
            .ok_or_else(|| TrailError::UnknownModel(record.item_type().to_string()))?;

        if event == EventKind::Update && !record.is_persisted() {
            return Err(TrailError::NotPersisted {
                item_type: record.item_type().to_string(),
                item_id: record.id().to_string(),
            });
        }

        if !model.tracks(event) {
            return Ok(None);
        }

        let gate = self
            .enablement
            .gate(record.item_type(), ctx.is_capturing_enabled_for_context());
        if !gate.is_open() {
            self.metrics.record_suppressed();
            log_event_with_fields(
                Event::CaptureSuppressed,
                &[
                    ("item_id", record.id()),
                    ("item_type", record.item_type()),
                    ("kind", event.as_str()),
                    ("reason", gate.as_str()),
                ],
            );
            return Ok(None);
        }

        let last = self
            .store
            .last(record.item_type(), record.id())
            .map_err(|e| self.capture_failed(event, record, e.into()))?;
        if last.map_or(false, |v| v.event() == EventKind::Destroy) {
            return Err(TrailError::ItemDestroyed {
                item_type: record.item_type().to_string(),
                item_id: record.id().to_string(),
            });
        }

        let attribution = Attribution::new(ctx.current_actor(), ctx.ambient_metadata());
        let builder = VersionBuilder::new(self.codec.as_ref(), self.tracks_object_changes());
        let draft = match event {
            EventKind::Create => builder.create(&model, record, &attribution).map(Some),
            EventKind::Update if force => {
                builder.forced_update(&model, record, &attribution).map(Some)
            }
            EventKind::Update => builder.update(&model, record, &attribution),
            EventKind::Destroy => builder.destroy(&model, record, &attribution).map(Some),
        }
        .map_err(|e| self.capture_failed(event, record, e.into()))?;

        let draft = match draft {
            Some(draft) => draft,
            None => {
                self.metrics.record_skipped();
                log_event_with_fields(
                    Event::CaptureSkipped,
                    &[
                        ("item_id", record.id()),
                        ("item_type", record.item_type()),
                        ("kind", event.as_str()),
                    ],
                );
                return Ok(None);
            }
        };

        let version = self
            .store
            .append(draft)
            .map_err(|e| self.capture_failed(event, record, e.into()))?;

        self.metrics.record_captured(event);
        let version_id = version.id().to_string();
        log_event_with_fields(
            Event::VersionCaptured,
            &[
                ("item_id", record.id()),
                ("item_type", record.item_type()),
                ("kind", event.as_str()),
                ("version_id", version_id.as_str()),
            ],
        );
        Ok(Some(version))
    }

    fn capture_failed(&self, event: EventKind, record: &Record, err: TrailError) -> TrailError {
        self.metrics.record_capture_failure();
        let reason = err.to_string();
        log_event_with_fields(
            Event::CaptureFailed,
            &[
                ("code", err.code()),
                ("item_id", record.id()),
                ("item_type", record.item_type()),
                ("kind", event.as_str()),
                ("reason", reason.as_str()),
            ],
        );
        err
    }

    fn tracks_object_changes(&self) -> bool {
        self.config.track_object_changes && self.store.supports_object_changes()
    }

    // ==================
    // History
    // ==================

    /// All versions of `record`'s item, oldest first.
    pub fn versions(&self, record: &Record) -> TrailResult<Vec<Version>> {
        Ok(self.store.list_ordered(record.item_type(), record.id())?)
    }

    /// Default reification options: no associations, configured lookback.
    pub fn reify_options(&self) -> ReifyOptions {
        ReifyOptions::default().lookback(self.config.has_one_lookback())
    }

    /// The record as it was before `version`'s event.
    pub fn reify(&self, version: &Version) -> TrailResult<Record> {
        self.reify_with(version, self.reify_options())
    }

    pub fn reify_with(&self, version: &Version, options: ReifyOptions) -> TrailResult<Record> {
        let result = self.navigator().reify(version, options);
        self.observe(version.item_type(), version.item_id(), result)
    }

    /// The record as it was at `at`, `None` if it did not exist yet.
    pub fn version_at(&self, record: &Record, at: DateTime<Utc>) -> TrailResult<Option<Record>> {
        self.version_at_with(record, at, self.reify_options())
    }

    pub fn version_at_with(
        &self,
        record: &Record,
        at: DateTime<Utc>,
        options: ReifyOptions,
    ) -> TrailResult<Option<Record>> {
        let result = self.navigator().version_at(record, at, options);
        self.observe(record.item_type(), record.id(), result)
    }

    pub fn previous_version(&self, record: &Record) -> TrailResult<Option<Record>> {
        let result = self.navigator().previous_version(record, self.reify_options());
        self.observe(record.item_type(), record.id(), result)
    }

    pub fn next_version(&self, record: &Record) -> TrailResult<Option<Record>> {
        let result = self.navigator().next_version(record, self.reify_options());
        self.observe(record.item_type(), record.id(), result)
    }

    /// States the item passed through for versions created in `[from, to]`.
    pub fn versions_between(
        &self,
        record: &Record,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TrailResult<Vec<Record>> {
        let result = self
            .navigator()
            .versions_between(record, from, to, self.reify_options());
        self.observe(record.item_type(), record.id(), result)
    }

    /// Whodunnit of the item's most recent version.
    pub fn originator(&self, record: &Record) -> TrailResult<Option<String>> {
        Ok(self.navigator().originator(record)?)
    }

    /// Zero-based position of `version` in its item's history.
    pub fn version_index(&self, version: &Version) -> TrailResult<Option<usize>> {
        Ok(self.navigator().index(version)?)
    }

    /// Decoded `{attribute: (before, after)}` of `version`.
    pub fn changeset(&self, version: &Version) -> TrailResult<Changeset> {
        let result = self.reifier.changeset(version);
        self.observe(version.item_type(), version.item_id(), result)
    }

    fn navigator(&self) -> Navigator<'_> {
        Navigator::new(
            self.store.as_ref(),
            &self.reifier,
            &self.registry,
            self.resolver.as_ref(),
        )
    }

    /// Count and log a reification outcome.
    fn observe<T>(
        &self,
        item_type: &str,
        item_id: &str,
        result: ReifyResult<T>,
    ) -> TrailResult<T> {
        match result {
            Ok(value) => {
                self.metrics.record_reified();
                Ok(value)
            }
            Err(e @ ReifyError::NothingToReify { .. }) => Err(e.into()),
            Err(e) => {
                self.metrics.record_reify_failure();
                let reason = e.to_string();
                log_event_with_fields(
                    Event::ReifyFailed,
                    &[
                        ("item_id", item_id),
                        ("item_type", item_type),
                        ("reason", reason.as_str()),
                    ],
                );
                Err(e.into())
            }
        }
    }
}
