//! Feature vector assembly.
//!
//! The trained model expects a fixed, ordered list of columns. `FeatureLayout`
//! resolves everything name-based (slots, scaler columns) to positions once at
//! load time, so encoding a listing is a handful of indexed writes:
//!
//! 1. zero vector of `len(columns)`
//! 2. numeric slots (engine capacity, mileage, age, spare key, target means)
//! 3. one-hot indicators for brand / transmission / fuel type / ownership
//! 4. scaler-managed columns gathered, scaled and spliced back

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ListingAttributes;
use crate::encoding::categorical::{OneHotField, TargetEncoders};
use crate::error::ArtifactError;
use crate::math::NumericScaler;

/// Column names that computed numeric values are written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSlots {
    pub engine_capacity: String,
    pub mileage: String,
    pub age: String,
    pub spare_key: String,
    /// Target-encoded model.
    pub model: String,
    /// Target-encoded brand (only written for `target_mean` bundles).
    pub brand: String,
}

impl Default for FeatureSlots {
    fn default() -> Self {
        Self {
            engine_capacity: "engine_capacity".to_string(),
            mileage: "km_driven".to_string(),
            age: "age".to_string(),
            spare_key: "spare_key".to_string(),
            model: "model".to_string(),
            brand: "brand".to_string(),
        }
    }
}

/// Slot positions; `None` when the bundle has no such column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotPositions {
    pub engine_capacity: Option<usize>,
    pub mileage: Option<usize>,
    pub age: Option<usize>,
    pub spare_key: Option<usize>,
    pub model: Option<usize>,
    pub brand: Option<usize>,
}

/// Ordered feature columns plus pre-resolved write positions.
#[derive(Debug, Clone)]
pub struct FeatureLayout {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    slots: SlotPositions,
    scaler_positions: Vec<usize>,
}

impl FeatureLayout {
    /// Resolve slots and scaler columns against the column order.
    ///
    /// `brand_target_encoded` makes the brand slot mandatory.
    pub fn new(
        columns: Vec<String>,
        slots: &FeatureSlots,
        scaler: &NumericScaler,
        brand_target_encoded: bool,
    ) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::invalid("feature column list is empty"));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if name.is_empty() {
                return Err(ArtifactError::invalid(format!("feature column {i} has an empty name")));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(ArtifactError::invalid(format!("feature column `{name}` is listed twice")));
            }
        }

        let position = |name: &str| index.get(name).copied();
        let resolved = SlotPositions {
            engine_capacity: position(&slots.engine_capacity),
            mileage: position(&slots.mileage),
            age: position(&slots.age),
            spare_key: position(&slots.spare_key),
            model: position(&slots.model),
            brand: if brand_target_encoded {
                Some(position(&slots.brand).ok_or_else(|| {
                    ArtifactError::invalid(format!(
                        "brand is target-encoded but there is no `{}` feature column",
                        slots.brand
                    ))
                })?)
            } else {
                None
            },
        };

        let scaler_positions = scaler
            .columns()
            .iter()
            .map(|name| {
                position(name).ok_or_else(|| {
                    ArtifactError::invalid(format!("scaler column `{name}` is not a feature column"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            columns,
            index,
            slots: resolved,
            scaler_positions,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn slots(&self) -> SlotPositions {
        self.slots
    }

    /// Whether encoding needs a raw `engine_capacity` value.
    pub fn requires_engine_capacity(&self) -> bool {
        self.slots.engine_capacity.is_some()
    }

    /// Number of one-hot indicator columns per field.
    pub fn indicator_counts(&self) -> Vec<(OneHotField, usize)> {
        OneHotField::ALL
            .iter()
            .map(|&field| {
                let prefix = format!("{}_", field.prefix());
                (field, self.columns.iter().filter(|c| c.starts_with(&prefix)).count())
            })
            .collect()
    }

    /// Build the ordered feature vector for a validated listing.
    ///
    /// The returned vector always has exactly `self.len()` entries.
    pub fn encode(
        &self,
        listing: &ListingAttributes,
        reference_year: i32,
        encoders: &TargetEncoders,
        scaler: &NumericScaler,
    ) -> Vec<f64> {
        let mut features = vec![0.0; self.columns.len()];

        // Negative ages (future model years) pass through unchanged.
        let age = f64::from(reference_year) - f64::from(listing.year);

        let mut put = |slot: Option<usize>, value: f64| {
            if let Some(i) = slot {
                features[i] = value;
            }
        };
        put(self.slots.engine_capacity, listing.engine_capacity.unwrap_or(0.0));
        put(self.slots.mileage, listing.mileage);
        put(self.slots.age, age);
        put(self.slots.spare_key, f64::from(listing.spare_key));
        put(self.slots.model, encoders.model.encode(&listing.model));
        if let Some(brand) = &encoders.brand {
            put(self.slots.brand, brand.encode(&listing.brand));
        }

        let categorical = [
            (OneHotField::Brand, Some(listing.brand.as_str())),
            (OneHotField::Transmission, listing.transmission.as_deref()),
            (OneHotField::FuelType, listing.fuel_type.as_deref()),
            (OneHotField::Ownership, listing.ownership.as_deref()),
        ];
        for (field, value) in categorical {
            let Some(value) = value else { continue };
            let column = field.column(value);
            match self.index.get(&column) {
                Some(&i) => features[i] = 1.0,
                None => debug!(%column, "no indicator column for category, skipping"),
            }
        }

        let raw: Vec<f64> = self.scaler_positions.iter().map(|&i| features[i]).collect();
        let scaled = scaler.transform(&raw);
        for (&i, v) in self.scaler_positions.iter().zip(scaled) {
            features[i] = v;
        }

        features
    }
}
