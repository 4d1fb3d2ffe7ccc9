//! The price estimator.
//!
//! `estimate` is a pure function of the request and the (immutable) artifact
//! bundle, so a single `PriceEstimator` can be cloned into any number of
//! threads. `respond` / `respond_json` are the request/response boundary: they
//! never fail, every error becomes a `{success: false, error}` response.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::artifacts::EncodingArtifacts;
use crate::domain::{EstimateResponse, EstimatorConfig, ListingAttributes, RawListingAttributes};
use crate::error::EstimateError;
use crate::math::round_price;

#[derive(Debug, Clone)]
pub struct PriceEstimator {
    artifacts: Arc<EncodingArtifacts>,
    config: EstimatorConfig,
}

impl PriceEstimator {
    pub fn new(artifacts: Arc<EncodingArtifacts>, config: EstimatorConfig) -> Self {
        Self { artifacts, config }
    }

    pub fn artifacts(&self) -> &EncodingArtifacts {
        &self.artifacts
    }

    pub fn config(&self) -> EstimatorConfig {
        self.config
    }

    /// Estimate the price of a raw listing, rounded to cents.
    pub fn estimate(&self, raw: &RawListingAttributes) -> Result<f64, EstimateError> {
        let listing = ListingAttributes::from_raw(raw, self.artifacts.layout().requires_engine_capacity())?;
        self.estimate_listing(&listing)
    }

    /// Estimate the price of an already validated listing.
    pub fn estimate_listing(&self, listing: &ListingAttributes) -> Result<f64, EstimateError> {
        let features = self.artifacts.encode(listing, self.config.reference_year);
        let margin = self.artifacts.forest().predict(&features)?;

        let price = round_price(self.artifacts.manifest().target_transform.apply(margin));
        if !price.is_finite() {
            return Err(EstimateError::Inference(format!(
                "target transform produced a non-finite price from margin {margin}"
            )));
        }
        Ok(price)
    }

    pub fn respond(&self, raw: &RawListingAttributes) -> EstimateResponse {
        match self.estimate(raw) {
            Ok(price) => EstimateResponse::ok(price),
            Err(err) => failure(err),
        }
    }

    /// Handle a raw request body.
    pub fn respond_json(&self, body: &str) -> EstimateResponse {
        match parse_request(body) {
            Ok(raw) => self.respond(&raw),
            Err(err) => failure(err),
        }
    }
}

fn failure(err: EstimateError) -> EstimateResponse {
    warn!(error = %err, "prediction failed");
    EstimateResponse::failure(err.to_string())
}

/// Parse a request body into a raw record.
///
/// Only "not JSON" and "not an object" are errors here; everything about the
/// individual fields is checked during validation.
pub fn parse_request(body: &str) -> Result<RawListingAttributes, EstimateError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| EstimateError::MalformedRequest(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(EstimateError::MalformedRequest("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| EstimateError::MalformedRequest(e.to_string()))
}
