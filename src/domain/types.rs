//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - deserialized straight from a request body or a CSV row
//! - written into artifact manifests
//! - returned to callers as JSON

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the `brand` categorical enters the feature vector.
///
/// Bundles trained by different versions of the training notebook disagree on
/// this, so the manifest has to declare it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BrandEncoding {
    /// `brand` only appears through `brand_<value>` indicator columns.
    OneHot,
    /// `brand` is replaced by its learned target mean (plus any indicators that exist).
    TargetMean,
}

impl BrandEncoding {
    pub fn display_name(self) -> &'static str {
        match self {
            BrandEncoding::OneHot => "one-hot",
            BrandEncoding::TargetMean => "target mean",
        }
    }
}

/// Transform applied to the raw model margin to get back to a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// The model predicts price directly.
    #[default]
    None,
    /// The model was trained on `ln(1 + price)`.
    Log1p,
}

impl TargetTransform {
    pub fn apply(self, margin: f64) -> f64 {
        match self {
            TargetTransform::None => margin,
            TargetTransform::Log1p => margin.exp_m1(),
        }
    }
}

/// A raw estimate request, exactly as the caller sent it.
///
/// Every field is an untyped JSON value so that a wrong type is reported by the
/// estimator as a structured failure instead of a deserialization error at the
/// transport layer. `null` is treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListingAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_capacity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spare_key: Option<Value>,
}

/// A validated listing, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingAttributes {
    pub brand: String,
    pub model: String,
    pub year: i32,
    /// Kilometres driven.
    pub mileage: f64,
    /// Engine capacity in cc. Only required when the active bundle consumes it.
    pub engine_capacity: Option<f64>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub ownership: Option<String>,
    /// `1` if the seller has a spare key (the default), else `0`.
    pub spare_key: u8,
}

/// Response shape of a single estimate.
///
/// Serializes to `{"success": true, "price": 123.45}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EstimateResponse {
    pub fn ok(price: f64) -> Self {
        Self {
            success: true,
            price: Some(price),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            price: None,
            error: Some(message.into()),
        }
    }
}

/// Outcome of one row of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub line: usize,
    pub id: Option<String>,
    pub request: RawListingAttributes,
    pub response: EstimateResponse,
}

/// Per-process estimator settings (derived from CLI flags and environment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Year that listing age is measured against.
    pub reference_year: i32,
}

impl EstimatorConfig {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Settings using the local calendar year.
    pub fn current() -> Self {
        use chrono::Datelike;
        Self::new(chrono::Local::now().year())
    }
}
