//! Reification and history navigation
//!
//! - `Reifier` - decodes a version back into a record
//! - `Navigator` - steps a record through time over a `VersionStore`
//! - `AssociationResolver` - host hook for `has_one` children

mod engine;
mod errors;
mod navigator;

pub use engine::{ReifyOptions, Reifier, DEFAULT_HAS_ONE_LOOKBACK_SECS};
pub use errors::{ReifyError, ReifyResult};
pub use navigator::{AssociationResolver, Navigator, NoAssociations};
