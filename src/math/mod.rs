//! Numeric utilities: affine feature scaling and price rounding.

pub mod round;
pub mod scaler;

pub use round::*;
pub use scaler::*;
