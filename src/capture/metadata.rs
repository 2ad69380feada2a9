//! Metadata Merger
//!
//! Combines ambient (per-request) metadata with the model's `meta` rules.
//! Model rules win on a key collision. Ambient keys that would shadow a
//! version column are dropped; model keys were already validated at
//! registration.

use serde_json::Value;

use crate::model::{MetadataRule, ModelConfig, Record, RESERVED_COLUMNS};
use crate::version::Metadata;

pub struct MetadataMerger;

impl MetadataMerger {
    /// Merged extra columns for a version of `record`.
    pub fn merge(config: &ModelConfig, record: &Record, ambient: Option<&Metadata>) -> Metadata {
        let mut merged = Metadata::new();

        if let Some(ambient) = ambient {
            for (key, value) in ambient {
                if !RESERVED_COLUMNS.contains(&key.as_str()) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        for (key, rule) in config.meta() {
            merged.insert(key.clone(), Self::evaluate(config, rule, record));
        }

        merged
    }

    /// Value of one rule against `record`.
    ///
    /// An accessor name resolves to a registered accessor first, then to the
    /// attribute of that name, else null.
    pub fn evaluate(config: &ModelConfig, rule: &MetadataRule, record: &Record) -> Value {
        match rule {
            MetadataRule::Literal(value) => value.clone(),
            MetadataRule::Computed(f) => f(record),
            MetadataRule::Accessor(name) => match config.accessor(name) {
                Some(f) => f(record),
                None => record.get(name).cloned().unwrap_or(Value::Null),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        Record::new("Article", "1")
            .with_attribute("title", "Hello")
            .with_attribute("body", "world")
    }

    #[test]
    fn test_literal_computed_and_accessor() {
        let config = ModelConfig::builder("Article")
            .meta("answer", MetadataRule::Literal(json!(42)))
            .meta(
                "title_len",
                MetadataRule::computed(|r| {
                    json!(r.get("title").and_then(Value::as_str).map_or(0, str::len))
                }),
            )
            .meta("title", MetadataRule::accessor("title"))
            .build()
            .unwrap();

        let merged = MetadataMerger::merge(&config, &record(), None);
        assert_eq!(merged["answer"], json!(42));
        assert_eq!(merged["title_len"], json!(5));
        assert_eq!(merged["title"], json!("Hello"));
    }

    #[test]
    fn test_registered_accessor_beats_attribute() {
        let config = ModelConfig::builder("Article")
            .accessor("body", |_| json!("from accessor"))
            .meta("body_copy", MetadataRule::accessor("body"))
            .build()
            .unwrap();

        let merged = MetadataMerger::merge(&config, &record(), None);
        assert_eq!(merged["body_copy"], json!("from accessor"));
    }

    #[test]
    fn test_unknown_accessor_is_null() {
        let config = ModelConfig::builder("Article")
            .meta("missing", MetadataRule::accessor("nope"))
            .build()
            .unwrap();

        let merged = MetadataMerger::merge(&config, &record(), None);
        assert_eq!(merged["missing"], Value::Null);
    }

    #[test]
    fn test_model_rule_wins_over_ambient() {
        let config = ModelConfig::builder("Article")
            .meta("source", MetadataRule::Literal(json!("model")))
            .build()
            .unwrap();

        let mut ambient = Metadata::new();
        ambient.insert("source".to_string(), json!("request"));
        ambient.insert("ip".to_string(), json!("127.0.0.1"));

        let merged = MetadataMerger::merge(&config, &record(), Some(&ambient));
        assert_eq!(merged["source"], json!("model"));
        assert_eq!(merged["ip"], json!("127.0.0.1"));
    }

    #[test]
    fn test_ambient_reserved_keys_dropped() {
        let config = ModelConfig::builder("Article").build().unwrap();

        let mut ambient = Metadata::new();
        ambient.insert("whodunnit".to_string(), json!("mallory"));
        ambient.insert("event".to_string(), json!("destroy"));

        let merged = MetadataMerger::merge(&config, &record(), Some(&ambient));
        assert!(merged.is_empty());
    }
}
