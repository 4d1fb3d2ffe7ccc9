//! Synthetic data for demos and smoke tests.

pub mod synthetic;

pub use synthetic::{SyntheticConfig, generate_bundle, generate_listings};
