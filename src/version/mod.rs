//! Version Domain Types
//!
//! This module provides:
//! - `VersionId` - Store-assigned version identity (tie-break for equal timestamps)
//! - `EventKind` - The lifecycle event a version records
//! - `Version` - Immutable, write-once version event
//! - `VersionDraft` - A staged version awaiting an identity from the store
//! - `ObjectCodec` - Encode/decode capability for stored payloads
//!
//! A version stores the state of its item *before* the recorded event.
//! The `create` version of an item therefore carries no prior state.

mod codec;
mod event;

pub use codec::{Changeset, CodecError, CodecResult, JsonCodec, ObjectCodec};
pub use event::{EventKind, Metadata, Version, VersionDraft, VersionId};
