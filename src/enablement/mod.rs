//! Capture enablement
//!
//! - `Enablement` - global, per-model and thread-scoped switches
//! - `SuppressionGuard` - RAII scope for `without_versioning`

mod controller;
mod guard;

pub use controller::{Enablement, Gate};
pub use guard::SuppressionGuard;
