//! `listing-price` library crate.
//!
//! The binary (`price`) is a thin wrapper around this library so that:
//!
//! - the estimator is testable without spawning processes
//! - a service front-end can embed `PriceEstimator` directly
//!
//! Data flow: `artifacts` (load + validate) -> `domain` (validate request) ->
//! `encoding` (feature vector) -> `models` (tree ensemble) -> `estimate` (response).

pub mod app;
pub mod artifacts;
pub mod cli;
pub mod data;
pub mod domain;
pub mod encoding;
pub mod error;
pub mod estimate;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

#[cfg(test)]
mod testing;
