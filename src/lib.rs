//! aerotrail - A strict, deterministic audit trail and record versioning engine
//!
//! Every create, update and destroy of a tracked record appends an immutable
//! version holding the record's state before the event. History can be
//! listed, stepped through and reified back into records.

pub mod capture;
pub mod cli;
pub mod context;
pub mod enablement;
pub mod model;
pub mod observability;
pub mod reify;
pub mod store;
pub mod trail;
pub mod version;

pub use context::{ContextProvider, NoContext, RequestContext};
pub use model::{MetadataRule, ModelConfig, Record};
pub use reify::{AssociationResolver, ReifyOptions};
pub use store::{FileVersionStore, MemoryVersionStore, VersionStore};
pub use trail::{Trail, TrailConfig, TrailError, TrailResult};
pub use version::{EventKind, Version, VersionId};
