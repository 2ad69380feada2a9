//! # Model Registry

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::config::ModelConfig;
use super::errors::{ConfigError, ConfigResult};

/// Registry of versioned models, by item type.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelConfig>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Each item type registers once.
    pub fn register(&self, config: ModelConfig) -> ConfigResult<Arc<ModelConfig>> {
        let mut models = self
            .models
            .write()
            .map_err(|_| ConfigError::Unreadable("model registry lock poisoned".into()))?;

        if models.contains_key(config.item_type()) {
            return Err(ConfigError::DuplicateModel(config.item_type().to_string()));
        }

        let config = Arc::new(config);
        models.insert(config.item_type().to_string(), Arc::clone(&config));
        Ok(config)
    }

    /// Get a model by item type
    pub fn get(&self, item_type: &str) -> Option<Arc<ModelConfig>> {
        self.models
            .read()
            .ok()
            .and_then(|models| models.get(item_type).cloned())
    }

    pub fn len(&self) -> usize {
        self.models.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
