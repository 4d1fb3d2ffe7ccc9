//! Price estimation: validation, encoding and inference behind one call.

pub mod estimator;

pub use estimator::*;
