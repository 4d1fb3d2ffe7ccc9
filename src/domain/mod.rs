//! Domain types used throughout the estimator.
//!
//! This module defines:
//!
//! - the raw request record (`RawListingAttributes`) and its validated form (`ListingAttributes`)
//! - the response shape (`EstimateResponse`)
//! - bundle-level enums (`BrandEncoding`, `TargetTransform`)

pub mod listing;
pub mod types;

pub use types::*;
