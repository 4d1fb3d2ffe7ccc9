//! Feature encoding: categorical encoders and feature vector assembly.

pub mod categorical;
pub mod features;

pub use categorical::*;
pub use features::*;
