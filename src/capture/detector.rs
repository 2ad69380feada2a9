//! Change Detector
//!
//! Given the attributes changed since last persisted and a model's filters:
//! 1. `candidate = changed - ignore - skip`
//! 2. If `only` is non-empty, `candidate = candidate ∩ only`
//! 3. The change is notable iff `candidate` is non-empty
//!
//! `ignore` applies before `only`, so `only` never resurrects an ignored attribute.

use std::collections::BTreeSet;

use crate::model::AttributeFilters;

/// Stateless change detector.
///
/// Identical inputs always produce identical output.
pub struct ChangeDetector;

impl ChangeDetector {
    /// The changed attributes that survive the filters.
    pub fn notable_changes<'a, I>(changed: I, filters: &AttributeFilters) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        changed
            .into_iter()
            .filter(|attr| !filters.ignore.contains(*attr))
            .filter(|attr| !filters.skip.contains(*attr))
            .filter(|attr| filters.only.is_empty() || filters.only.contains(*attr))
            .map(str::to_string)
            .collect()
    }

    /// Returns true if the change set is notable under the filters.
    pub fn is_notable<'a, I>(changed: I, filters: &AttributeFilters) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        !Self::notable_changes(changed, filters).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(ignore: &[&str], only: &[&str], skip: &[&str]) -> AttributeFilters {
        let set = |s: &[&str]| s.iter().map(|a| a.to_string()).collect();
        AttributeFilters {
            ignore: set(ignore),
            only: set(only),
            skip: set(skip),
        }
    }

    #[test]
    fn test_no_filters_everything_notable() {
        let f = filters(&[], &[], &[]);
        let notable = ChangeDetector::notable_changes(["name", "color"], &f);
        assert_eq!(notable.len(), 2);
    }

    #[test]
    fn test_empty_change_set_not_notable() {
        let f = filters(&[], &[], &[]);
        assert!(!ChangeDetector::is_notable(Vec::<&str>::new(), &f));
    }

    #[test]
    fn test_ignore_removes_attribute() {
        let f = filters(&["updated_at"], &[], &[]);
        assert!(!ChangeDetector::is_notable(["updated_at"], &f));
        assert!(ChangeDetector::is_notable(["updated_at", "name"], &f));
    }

    #[test]
    fn test_skip_removes_attribute() {
        let f = filters(&[], &[], &["secret"]);
        assert!(!ChangeDetector::is_notable(["secret"], &f));
    }

    #[test]
    fn test_only_restricts() {
        let f = filters(&[], &["name"], &[]);
        assert!(!ChangeDetector::is_notable(["color"], &f));

        let notable = ChangeDetector::notable_changes(["color", "name"], &f);
        assert_eq!(notable.into_iter().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_only_cannot_resurrect_ignored() {
        let f = filters(&["name"], &["name", "color"], &[]);
        assert!(!ChangeDetector::is_notable(["name"], &f));
        assert!(ChangeDetector::is_notable(["color"], &f));
    }

    #[test]
    fn test_deterministic() {
        let f = filters(&["a"], &[], &["b"]);
        let first = ChangeDetector::notable_changes(["c", "a", "d", "b"], &f);
        let second = ChangeDetector::notable_changes(["d", "b", "c", "a"], &f);
        assert_eq!(first, second);
    }
}
