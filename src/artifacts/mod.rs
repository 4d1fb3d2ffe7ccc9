//! Artifact bundle: manifest, loading/validation and writing.
//!
//! - `bundle`: `EncodingArtifacts` and the on-disk manifest
//! - `files`: JSON read/write helpers

pub mod bundle;
pub mod files;

pub use bundle::*;
