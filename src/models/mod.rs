//! Price model implementations.
//!
//! Only boosted-tree ensembles are supported; the training pipeline exports
//! XGBoost tree dumps.

pub mod booster;

pub use booster::*;
