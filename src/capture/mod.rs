//! Capture pipeline
//!
//! Pure stages from a mutated record to a staged version:
//! 1. `ChangeDetector` - decides whether an update is notable
//! 2. `ShadowBuilder` - reconstructs the prior state and the changeset
//! 3. `MetadataMerger` - evaluates extra columns
//! 4. `VersionBuilder` - assembles the `VersionDraft`

mod builder;
mod detector;
mod metadata;
mod shadow;

pub use builder::{Attribution, VersionBuilder};
pub use detector::ChangeDetector;
pub use metadata::MetadataMerger;
pub use shadow::ShadowBuilder;
