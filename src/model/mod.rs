//! Trackable models
//!
//! - `Record` - A live or reified record with dirty tracking
//! - `ModelConfig` - Per-model versioning configuration (events, filters, metadata, associations)
//! - `ModelRegistry` - Registered models by item type

mod config;
mod errors;
mod record;
mod registry;

pub use config::{
    Association, AttributeFilters, ComputedFn, MetadataRule, ModelConfig, ModelConfigBuilder,
    RESERVED_COLUMNS,
};
pub use errors::{ConfigError, ConfigResult};
pub use record::{Attributes, Record};
pub use registry::ModelRegistry;
