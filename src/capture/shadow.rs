//! State Diff Builder
//!
//! Reconstructs how a record looked immediately before the current mutation:
//! project the current attributes, overlay the recorded before-values, drop
//! `skip` attributes. Timestamp-like attributes keep their current value
//! unless they carry a before-value of their own; the projection starts from
//! the current attributes, so nothing is ever blanked.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::model::{Attributes, Record};
use crate::version::Changeset;

/// Pure prior-state and changeset construction.
pub struct ShadowBuilder;

impl ShadowBuilder {
    /// The attribute snapshot before the mutation, without `skip` attributes.
    pub fn prior_state(
        current: &Attributes,
        before: &Attributes,
        skip: &BTreeSet<String>,
    ) -> Attributes {
        let mut shadow = current.clone();
        for (name, value) in before {
            shadow.insert(name.clone(), value.clone());
        }
        shadow.retain(|name, _| !skip.contains(name));
        shadow
    }

    /// The attribute snapshot as it stands, without `skip` attributes.
    pub fn snapshot(current: &Attributes, skip: &BTreeSet<String>) -> Attributes {
        current
            .iter()
            .filter(|(name, _)| !skip.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// `{attribute: (before, after)}` restricted to `notable` attributes.
    pub fn changeset(record: &Record, notable: &BTreeSet<String>) -> Changeset {
        notable
            .iter()
            .map(|name| {
                let before = record
                    .before_values()
                    .get(name)
                    .or_else(|| record.get(name))
                    .cloned()
                    .unwrap_or(Value::Null);
                let after = record.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), (before, after))
            })
            .collect()
    }
}
