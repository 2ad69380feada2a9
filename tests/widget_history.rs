//! Widget History Tests
//!
//! A widget is created as "A", renamed to "B", renamed to "C" and finally
//! destroyed. Every way of reading that history must agree:
//! - versions are ordered by `(created_at, id)`
//! - each version holds the state before its event
//! - stepping back and forward round-trips
//! - `version_at` answers "what did it look like then"

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aerotrail::{
    EventKind, MemoryVersionStore, ModelConfig, NoContext, Record, RequestContext, Trail,
    TrailError, Version,
};
use serde_json::json;

// =============================================================================
// Test Utilities
// =============================================================================

fn trail() -> Trail {
    let trail = Trail::new(Arc::new(MemoryVersionStore::new()));
    trail
        .register(ModelConfig::builder("Widget").build().unwrap())
        .expect("Widget registers");
    trail
}

/// Separate capture timestamps so time-based lookups are unambiguous.
fn tick() {
    thread::sleep(Duration::from_millis(3));
}

/// Create "A", then rename to "B" and "C". Returns the live widget.
fn abc(trail: &Trail) -> Record {
    let mut widget = Record::new("Widget", "w1").with_attribute("name", "A");
    trail
        .after_create(&widget, &RequestContext::for_actor("alice"))
        .expect("create captured");
    widget.mark_persisted();

    for (name, actor) in [("B", "bob"), ("C", "carol")] {
        tick();
        widget.set("name", name);
        trail
            .before_update(&widget, &RequestContext::for_actor(actor))
            .expect("update captured");
        widget.mark_persisted();
    }

    widget
}

fn name(record: &Record) -> &str {
    record
        .get("name")
        .and_then(|v| v.as_str())
        .expect("name attribute")
}

// =============================================================================
// Capture
// =============================================================================

#[test]
fn test_three_versions_in_order() {
    let trail = trail();
    let widget = abc(&trail);

    let versions = trail.versions(&widget).unwrap();
    let events: Vec<EventKind> = versions.iter().map(Version::event).collect();
    assert_eq!(
        events,
        vec![EventKind::Create, EventKind::Update, EventKind::Update]
    );

    let keys: Vec<_> = versions.iter().map(Version::order_key).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_each_version_holds_prior_state() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    assert_eq!(versions[0].object(), None);
    assert_eq!(name(&trail.reify(&versions[1]).unwrap()), "A");
    assert_eq!(name(&trail.reify(&versions[2]).unwrap()), "B");
}

#[test]
fn test_reifying_create_is_typed_not_found() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    let err = trail.reify(&versions[0]).unwrap_err();
    assert!(matches!(err, TrailError::Reification(_)));
}

#[test]
fn test_whodunnit_and_originator() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    let actors: Vec<_> = versions.iter().map(|v| v.whodunnit()).collect();
    assert_eq!(actors, vec![Some("alice"), Some("bob"), Some("carol")]);
    assert_eq!(versions[2].terminator(), Some("carol"));
    assert_eq!(trail.originator(&widget).unwrap().as_deref(), Some("carol"));
}

#[test]
fn test_changesets() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    let created = trail.changeset(&versions[0]).unwrap();
    assert_eq!(created["name"], (json!(null), json!("A")));

    let renamed = trail.changeset(&versions[2]).unwrap();
    assert_eq!(renamed["name"], (json!("B"), json!("C")));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_previous_and_next_round_trip() {
    let trail = trail();
    let widget = abc(&trail);

    let b = trail.previous_version(&widget).unwrap().expect("state B");
    assert_eq!(name(&b), "B");
    assert!(!b.is_live());

    let a = trail.previous_version(&b).unwrap().expect("state A");
    assert_eq!(name(&a), "A");
    assert!(trail.previous_version(&a).unwrap().is_none());

    assert_eq!(trail.next_version(&a).unwrap(), Some(b.clone()));
    assert!(trail.next_version(&b).unwrap().is_none());
    assert!(trail.next_version(&widget).unwrap().is_none());
}

#[test]
fn test_version_at_points_in_time() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();
    let t = |i: usize| versions[i].created_at();

    let before = t(0) - chrono::Duration::milliseconds(1);
    assert!(trail.version_at(&widget, before).unwrap().is_none());

    assert_eq!(name(&trail.version_at(&widget, t(0)).unwrap().unwrap()), "A");
    assert_eq!(name(&trail.version_at(&widget, t(1)).unwrap().unwrap()), "B");

    let now = trail.version_at(&widget, t(2)).unwrap().unwrap();
    assert!(now.is_live());
    assert_eq!(name(&now), "C");
}

#[test]
fn test_versions_between() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    let states = trail
        .versions_between(&widget, versions[0].created_at(), versions[2].created_at())
        .unwrap();
    let names: Vec<_> = states.iter().map(name).collect();

    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn test_version_index() {
    let trail = trail();
    let widget = abc(&trail);
    let versions = trail.versions(&widget).unwrap();

    for (i, version) in versions.iter().enumerate() {
        assert_eq!(trail.version_index(version).unwrap(), Some(i));
    }
}

// =============================================================================
// Destroy
// =============================================================================

#[test]
fn test_destroy_snapshots_full_state() {
    let trail = trail();
    let widget = abc(&trail);

    let destroyed = trail
        .after_destroy(&widget, &NoContext)
        .unwrap()
        .expect("destroy captured");

    assert_eq!(destroyed.event(), EventKind::Destroy);
    assert_eq!(destroyed.object_changes(), None);
    assert_eq!(name(&trail.reify(&destroyed).unwrap()), "C");
}

#[test]
fn test_no_captures_after_destroy() {
    let trail = trail();
    let mut widget = abc(&trail);
    trail.after_destroy(&widget, &NoContext).unwrap();

    widget.set("name", "D");
    let err = trail.before_update(&widget, &NoContext).unwrap_err();
    assert!(matches!(err, TrailError::ItemDestroyed { .. }));

    let err = trail.after_destroy(&widget, &NoContext).unwrap_err();
    assert_eq!(err.code(), "TRAIL_ITEM_DESTROYED");

    let destroys = trail
        .versions(&widget)
        .unwrap()
        .iter()
        .filter(|v| v.event() == EventKind::Destroy)
        .count();
    assert_eq!(destroys, 1);
}

#[test]
fn test_previous_version_after_destroy_is_last_state() {
    let trail = trail();
    let widget = abc(&trail);
    trail.after_destroy(&widget, &NoContext).unwrap();

    let last = trail.previous_version(&widget).unwrap().unwrap();
    assert_eq!(name(&last), "C");
}

#[test]
fn test_metrics_count_captures() {
    let trail = trail();
    let widget = abc(&trail);
    trail.after_destroy(&widget, &NoContext).unwrap();

    let snapshot = trail.metrics().snapshot();
    assert_eq!(snapshot.creates_captured, 1);
    assert_eq!(snapshot.updates_captured, 2);
    assert_eq!(snapshot.destroys_captured, 1);
    assert_eq!(trail.metrics().versions_captured(), 4);
}
