//! Synthetic artifact bundles and listings.
//!
//! Real bundles come from the offline training pipeline. For demos and smoke
//! tests we generate a self-consistent bundle from a seed instead:
//!
//! - target means per model drawn around a per-brand base price
//! - one-hot columns for a fixed catalogue of categories
//! - a standard scaler over `(engine_capacity, km_driven, age)`
//! - trees whose leaves accumulate a signed step along the path, so that e.g.
//!   higher mileage and age push the price down and larger engines push it up
//!
//! Same seed, same output.

use std::collections::HashMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};
use serde_json::{Value, json};

use crate::artifacts::{BundleManifest, BundleParts};
use crate::domain::{BrandEncoding, RawListingAttributes};
use crate::encoding::{FeatureSlots, OneHotField};
use crate::error::AppError;
use crate::math::ScalerSpec;
use crate::models::DumpNode;

/// Brand, its models, and a typical resale price.
const CATALOGUE: &[(&str, &[&str], f64)] = &[
    ("Toyota", &["Corolla", "Camry", "Yaris"], 14_000.0),
    ("Honda", &["Civic", "City", "Accord"], 12_500.0),
    ("Suzuki", &["Swift", "Alto", "Ciaz"], 7_000.0),
    ("Hyundai", &["i20", "Creta", "Verna"], 10_000.0),
    ("Ford", &["Focus", "Fiesta", "EcoSport"], 9_000.0),
];
const TRANSMISSIONS: &[&str] = &["Manual", "Automatic"];
const FUEL_TYPES: &[&str] = &["Petrol", "Diesel", "CNG", "Electric"];
const OWNERSHIP: &[&str] = &["1st owner", "2nd owner", "3rd owner"];
const ENGINE_CAPACITIES: &[f64] = &[998.0, 1197.0, 1498.0, 1798.0, 1998.0, 2494.0];

/// Scaler parameters for `(engine_capacity, km_driven, age)`.
const SCALER_MEAN: [f64; 3] = [1500.0, 60_000.0, 6.0];
const SCALER_SCALE: [f64; 3] = [400.0, 35_000.0, 3.5];

/// Chance of a leaf appearing before `max_depth` (depth >= 1).
const EARLY_LEAF_PROB: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub brand_encoding: BrandEncoding,
    /// Shrinkage applied to every tree's contribution.
    pub learning_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trees: 50,
            max_depth: 4,
            brand_encoding: BrandEncoding::OneHot,
            learning_rate: 0.1,
        }
    }
}

/// How a column is split on and which way it moves the price.
#[derive(Debug, Clone, Copy)]
struct ColumnRole {
    /// `None` for standardized numeric columns (threshold drawn from N(0, 1)).
    threshold: Option<(f64, f64)>,
    /// +1 if larger values mean a higher price, -1 if lower.
    direction: f64,
}

/// Generate a complete, valid bundle.
pub fn generate_bundle(config: &SyntheticConfig) -> Result<BundleParts, AppError> {
    if config.n_trees == 0 {
        return Err(AppError::new(2, "Synthetic bundle needs at least one tree."));
    }
    if config.max_depth == 0 || config.max_depth > 12 {
        return Err(AppError::new(2, "Tree depth must be between 1 and 12."));
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(AppError::new(2, "Learning rate must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let spread = Normal::<f64>::new(1.0, 0.15).map_err(|e| AppError::new(4, format!("Distribution error: {e}")))?;

    // Catalogue order, so sums are reproducible bit for bit.
    let mut ordered_means: Vec<(&str, f64)> = Vec::new();
    let mut brand_means = HashMap::new();
    for &(brand, models, base) in CATALOGUE {
        let mut total = 0.0;
        for &model in models {
            let mean = base * spread.sample(&mut rng).max(0.5);
            ordered_means.push((model, mean));
            total += mean;
        }
        brand_means.insert(brand.to_string(), total / models.len() as f64);
    }
    let global_mean = ordered_means.iter().map(|&(_, m)| m).sum::<f64>() / ordered_means.len() as f64;
    let (te_min, te_max) = ordered_means
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    let model_means: HashMap<String, f64> = ordered_means.into_iter().map(|(m, v)| (m.to_string(), v)).collect();

    let slots = FeatureSlots::default();
    let scaled = [&slots.engine_capacity, &slots.mileage, &slots.age];

    let mut columns: Vec<(String, ColumnRole)> = vec![
        (slots.engine_capacity.clone(), numeric(1.0)),
        (slots.mileage.clone(), numeric(-1.0)),
        (slots.age.clone(), numeric(-1.0)),
        (slots.spare_key.clone(), indicator(0.3)),
        (slots.model.clone(), target_mean(te_min, te_max)),
    ];
    match config.brand_encoding {
        BrandEncoding::TargetMean => columns.push((slots.brand.clone(), target_mean(te_min, te_max))),
        BrandEncoding::OneHot => {
            for &(brand, _, base) in CATALOGUE {
                let direction = if base >= global_mean { 1.0 } else { -1.0 };
                columns.push((OneHotField::Brand.column(brand), indicator(direction)));
            }
        }
    }
    for (field, values, directions) in [
        (OneHotField::Transmission, TRANSMISSIONS, &[-0.5, 0.5][..]),
        (OneHotField::FuelType, FUEL_TYPES, &[0.0, 0.3, -0.3, 0.8][..]),
        (OneHotField::Ownership, OWNERSHIP, &[0.6, -0.2, -0.6][..]),
    ] {
        for (value, &direction) in values.iter().zip(directions) {
            columns.push((field.column(value), indicator(direction)));
        }
    }

    let step = global_mean * 0.05;
    let leaf_noise = Normal::<f64>::new(0.0, step * 0.25).map_err(|e| AppError::new(4, format!("Distribution error: {e}")))?;
    let mut trees = Vec::with_capacity(config.n_trees);
    for _ in 0..config.n_trees {
        let mut builder = TreeBuilder {
            rng: &mut rng,
            columns: &columns,
            max_depth: config.max_depth,
            step: step * config.learning_rate,
            noise: leaf_noise,
            learning_rate: config.learning_rate,
            next_id: 0,
        };
        trees.push(builder.node(0, 0.0));
    }

    let mut manifest = BundleManifest::new(config.brand_encoding);
    manifest.base_score = global_mean;

    Ok(BundleParts {
        manifest,
        feature_columns: columns.into_iter().map(|(name, _)| name).collect(),
        model_target_mean: model_means,
        brand_target_mean: match config.brand_encoding {
            BrandEncoding::TargetMean => Some(brand_means),
            BrandEncoding::OneHot => None,
        },
        global_mean,
        scaler: ScalerSpec::Standard {
            columns: scaled.iter().map(|s| s.to_string()).collect(),
            mean: SCALER_MEAN.to_vec(),
            scale: SCALER_SCALE.to_vec(),
        },
        trees,
    })
}

fn numeric(direction: f64) -> ColumnRole {
    ColumnRole {
        threshold: None,
        direction,
    }
}

fn indicator(direction: f64) -> ColumnRole {
    ColumnRole {
        threshold: Some((0.5, 0.5)),
        direction,
    }
}

fn target_mean(lo: f64, hi: f64) -> ColumnRole {
    ColumnRole {
        threshold: Some((lo, hi)),
        direction: 1.0,
    }
}

struct TreeBuilder<'a> {
    rng: &'a mut StdRng,
    columns: &'a [(String, ColumnRole)],
    max_depth: usize,
    step: f64,
    noise: Normal<f64>,
    learning_rate: f64,
    next_id: u32,
}

impl TreeBuilder<'_> {
    /// Build the subtree rooted at `depth`; `acc` is the signed effect accumulated so far.
    fn node(&mut self, depth: usize, acc: f64) -> DumpNode {
        let nodeid = self.next_id;
        self.next_id += 1;

        let stop = depth >= self.max_depth || (depth >= 1 && self.rng.gen_bool(EARLY_LEAF_PROB));
        if stop {
            let leaf = acc + self.noise.sample(&mut *self.rng) * self.learning_rate;
            return DumpNode::Leaf { nodeid, leaf };
        }

        let columns = self.columns;
        let (name, role) = &columns[self.rng.gen_range(0..columns.len())];
        let split_condition = match role.threshold {
            None => self.rng.gen_range(-1.5..1.5),
            Some((lo, hi)) if hi > lo => self.rng.gen_range(lo..hi),
            Some((lo, _)) => lo,
        };

        // `yes` is the "below threshold" side.
        let yes = self.node(depth + 1, acc - role.direction * self.step);
        let no = self.node(depth + 1, acc + role.direction * self.step);
        let (yes_id, no_id) = (node_id(&yes), node_id(&no));

        DumpNode::Split {
            nodeid,
            depth: Some(depth as u32),
            split: name.clone(),
            split_condition,
            yes: yes_id,
            no: no_id,
            missing: Some(yes_id),
            children: vec![yes, no],
        }
    }
}

fn node_id(node: &DumpNode) -> u32 {
    match node {
        DumpNode::Split { nodeid, .. } | DumpNode::Leaf { nodeid, .. } => *nodeid,
    }
}

/// Generate `n` raw listings over the synthetic catalogue.
///
/// Roughly one in twenty uses a brand/model the bundle has never seen, and one
/// in twenty omits `spare_key`.
pub fn generate_listings(seed: u64, n: usize, reference_year: i32) -> Result<Vec<RawListingAttributes>, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let km_per_year =
        LogNormal::new(12_000f64.ln(), 0.4).map_err(|e| AppError::new(4, format!("Distribution error: {e}")))?;

    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let (brand, model) = if rng.gen_bool(0.05) {
            ("Unobtainium", "Hovercar")
        } else {
            let &(brand, models, _) = pick(&mut rng, CATALOGUE);
            (brand, *pick(&mut rng, models))
        };
        let year = rng.gen_range(reference_year.saturating_sub(16)..=reference_year);
        let age = (f64::from(reference_year) - f64::from(year)).max(0.5);
        let mileage = (age * km_per_year.sample(&mut rng)).round();

        let mut listing = json!({
            "brand": brand,
            "model": model,
            "year": year,
            "mileage": mileage,
            "engine_capacity": *pick(&mut rng, ENGINE_CAPACITIES),
            "transmission": *pick(&mut rng, TRANSMISSIONS),
            "fuel_type": *pick(&mut rng, FUEL_TYPES),
            "ownership": *pick(&mut rng, OWNERSHIP),
        });
        if !rng.gen_bool(0.05) {
            listing["spare_key"] = Value::from(u8::from(rng.gen_bool(0.7)));
        }

        let raw = serde_json::from_value(listing)
            .map_err(|e| AppError::new(4, format!("Failed to build synthetic listing: {e}")))?;
        out.push(raw);
    }
    Ok(out)
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::artifacts::EncodingArtifacts;
    use crate::domain::{EstimatorConfig, ListingAttributes};
    use crate::estimate::PriceEstimator;

    #[test]
    fn same_seed_same_bundle() {
        let config = SyntheticConfig::default();
        let a = generate_bundle(&config).unwrap();
        let b = generate_bundle(&config).unwrap();
        assert_eq!(a.trees, b.trees);
        assert_eq!(a.feature_columns, b.feature_columns);
        assert_eq!(a.global_mean, b.global_mean);

        // Each run builds fresh hash maps; the output must not depend on their order.
        for _ in 0..20 {
            let again = generate_bundle(&config).unwrap();
            assert_eq!(again.global_mean.to_bits(), a.global_mean.to_bits());
            assert_eq!(again.manifest.base_score.to_bits(), a.manifest.base_score.to_bits());
            assert_eq!(again.trees, a.trees);
        }

        let c = generate_bundle(&SyntheticConfig { seed: 7, ..config }).unwrap();
        assert_ne!(a.trees, c.trees);
    }

    #[test]
    fn listings_near_the_smallest_reference_year_do_not_overflow() {
        let listings = generate_listings(5, 50, i32::MIN + 3).unwrap();
        assert_eq!(listings.len(), 50);
        for raw in &listings {
            let year = raw.year.as_ref().and_then(|v| v.as_i64()).unwrap();
            assert!(year >= i64::from(i32::MIN) && year <= i64::from(i32::MIN + 3));
        }
    }

    #[test]
    fn generated_bundles_validate_for_both_brand_encodings() {
        for brand_encoding in [BrandEncoding::OneHot, BrandEncoding::TargetMean] {
            let parts = generate_bundle(&SyntheticConfig {
                brand_encoding,
                ..SyntheticConfig::default()
            })
            .unwrap();
            let artifacts = EncodingArtifacts::from_parts(parts).unwrap();
            assert_eq!(artifacts.forest().n_trees(), 50);
            assert_eq!(artifacts.encoders().brand.is_some(), brand_encoding == BrandEncoding::TargetMean);
        }
    }

    #[test]
    fn every_synthetic_listing_estimates_with_full_length_vector() {
        let artifacts = Arc::new(EncodingArtifacts::from_parts(generate_bundle(&SyntheticConfig::default()).unwrap()).unwrap());
        let estimator = PriceEstimator::new(artifacts.clone(), EstimatorConfig::new(2025));

        let listings = generate_listings(11, 300, 2025).unwrap();
        assert!(listings.iter().any(|l| l.spare_key.is_none()));
        for raw in &listings {
            let listing = ListingAttributes::from_raw(raw, true).unwrap();
            assert_eq!(artifacts.encode(&listing, 2025).len(), artifacts.layout().len());

            let price = estimator.estimate(raw).unwrap();
            assert!(price.is_finite());
            assert!(((price * 100.0).round() - price * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_degenerate_configs() {
        let zero_trees = SyntheticConfig {
            n_trees: 0,
            ..SyntheticConfig::default()
        };
        assert!(generate_bundle(&zero_trees).is_err());

        let too_deep = SyntheticConfig {
            max_depth: 40,
            ..SyntheticConfig::default()
        };
        assert!(generate_bundle(&too_deep).is_err());
    }
}
