//! Categorical encoders.
//!
//! Two ways a categorical value reaches the model:
//!
//! - target encoding: replaced by the mean price observed for that category in
//!   training, with the global mean as the fallback for unseen values
//! - one-hot indicators: `"<field>_<value>"` columns set to `1`; values with no
//!   matching column simply contribute nothing
//!
//! Neither path can fail. Unseen categories are an expected, supported input.

use std::collections::HashMap;

use tracing::debug;

/// Outcome of a target-encoding lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryLookup {
    /// The category was seen in training.
    Known(f64),
    /// Unseen category; the global mean was substituted.
    Fallback(f64),
}

impl CategoryLookup {
    pub fn value(self) -> f64 {
        match self {
            CategoryLookup::Known(v) | CategoryLookup::Fallback(v) => v,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, CategoryLookup::Fallback(_))
    }
}

/// Target-mean encoder with an explicit fallback policy.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    feature: &'static str,
    means: HashMap<String, f64>,
    fallback: f64,
}

impl CategoricalEncoder {
    pub fn new(feature: &'static str, means: HashMap<String, f64>, fallback: f64) -> Self {
        Self {
            feature,
            means,
            fallback,
        }
    }

    pub fn lookup(&self, value: &str) -> CategoryLookup {
        match self.means.get(value) {
            Some(&mean) => CategoryLookup::Known(mean),
            None => CategoryLookup::Fallback(self.fallback),
        }
    }

    /// Encode a value; never fails.
    pub fn encode(&self, value: &str) -> f64 {
        let lookup = self.lookup(value);
        if lookup.is_fallback() {
            debug!(feature = self.feature, value, fallback = self.fallback, "unseen category, using global mean");
        }
        lookup.value()
    }

    pub fn feature(&self) -> &'static str {
        self.feature
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn means(&self) -> &HashMap<String, f64> {
        &self.means
    }
}

/// The target encoders active for a bundle.
#[derive(Debug, Clone)]
pub struct TargetEncoders {
    pub model: CategoricalEncoder,
    /// Present only when the bundle target-encodes `brand`.
    pub brand: Option<CategoricalEncoder>,
}

/// Categorical fields that may appear as one-hot indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneHotField {
    Brand,
    Transmission,
    FuelType,
    Ownership,
}

impl OneHotField {
    pub const ALL: [OneHotField; 4] = [
        OneHotField::Brand,
        OneHotField::Transmission,
        OneHotField::FuelType,
        OneHotField::Ownership,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            OneHotField::Brand => "brand",
            OneHotField::Transmission => "transmission",
            OneHotField::FuelType => "fuel_type",
            OneHotField::Ownership => "ownership",
        }
    }

    /// Indicator column name for a raw value, e.g. `ownership_1st owner`.
    ///
    /// The value is used verbatim: no trimming or case folding.
    pub fn column(self, value: &str) -> String {
        format!("{}_{value}", self.prefix())
    }
}
