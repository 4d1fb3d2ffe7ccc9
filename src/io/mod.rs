//! Input/output helpers.
//!
//! - CSV ingest of listing batches (`ingest`)
//! - batch result export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
