//! The encoding artifact bundle.
//!
//! A bundle is everything the estimator needs besides the request itself:
//! column order, target-encoding tables, the fitted scaler and the tree
//! ensemble. It is validated as a whole when constructed and is immutable
//! afterwards, so it can be shared freely between threads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifacts::files::{read_json, write_json};
use crate::domain::{BrandEncoding, ListingAttributes, TargetTransform};
use crate::encoding::{CategoricalEncoder, FeatureLayout, FeatureSlots, TargetEncoders};
use crate::error::ArtifactError;
use crate::math::{NumericScaler, ScalerSpec};
use crate::models::{DumpNode, Forest};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// XGBoost's default `base_score`.
const DEFAULT_BASE_SCORE: f64 = 0.5;

/// `manifest.json`: declares the bundle's encoding choices and file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Required: bundles must say how `brand` is encoded.
    pub brand_encoding: BrandEncoding,
    #[serde(default)]
    pub target_transform: TargetTransform,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    #[serde(default)]
    pub files: BundleFiles,
    #[serde(default)]
    pub slots: FeatureSlots,
}

impl BundleManifest {
    pub fn new(brand_encoding: BrandEncoding) -> Self {
        Self {
            format_version: SUPPORTED_FORMAT_VERSION,
            brand_encoding,
            target_transform: TargetTransform::None,
            base_score: DEFAULT_BASE_SCORE,
            files: BundleFiles::default(),
            slots: FeatureSlots::default(),
        }
    }
}

fn default_format_version() -> u32 {
    SUPPORTED_FORMAT_VERSION
}

fn default_base_score() -> f64 {
    DEFAULT_BASE_SCORE
}

/// File names of the individual artifacts, relative to the bundle directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleFiles {
    pub model: String,
    pub scaler: String,
    pub model_target_mean: String,
    pub brand_target_mean: String,
    pub feature_columns: String,
    pub global_mean: String,
}

impl Default for BundleFiles {
    fn default() -> Self {
        Self {
            model: "model.json".to_string(),
            scaler: "scaler.json".to_string(),
            model_target_mean: "model_te_mapping.json".to_string(),
            brand_target_mean: "brand_te_mapping.json".to_string(),
            feature_columns: "feature_columns.json".to_string(),
            global_mean: "global_mean.json".to_string(),
        }
    }
}

/// Unvalidated bundle contents, as read from (or about to be written to) disk.
#[derive(Debug, Clone)]
pub struct BundleParts {
    pub manifest: BundleManifest,
    pub feature_columns: Vec<String>,
    pub model_target_mean: HashMap<String, f64>,
    pub brand_target_mean: Option<HashMap<String, f64>>,
    pub global_mean: f64,
    pub scaler: ScalerSpec,
    pub trees: Vec<DumpNode>,
}

impl BundleParts {
    /// Read all files named by the manifest in `dir`.
    pub fn read(dir: &Path) -> Result<Self, ArtifactError> {
        let manifest: BundleManifest = read_json(&dir.join(MANIFEST_FILE))?;
        let files = &manifest.files;

        let brand_target_mean = match manifest.brand_encoding {
            BrandEncoding::TargetMean => Some(read_json(&dir.join(&files.brand_target_mean))?),
            BrandEncoding::OneHot => None,
        };

        Ok(Self {
            feature_columns: read_json(&dir.join(&files.feature_columns))?,
            model_target_mean: read_json(&dir.join(&files.model_target_mean))?,
            brand_target_mean,
            global_mean: read_json(&dir.join(&files.global_mean))?,
            scaler: read_json(&dir.join(&files.scaler))?,
            trees: read_json(&dir.join(&files.model))?,
            manifest,
        })
    }

    /// Write the bundle into `dir` (created if needed).
    pub fn write(&self, dir: &Path) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let files = &self.manifest.files;
        write_json(&dir.join(MANIFEST_FILE), &self.manifest)?;
        write_json(&dir.join(&files.feature_columns), &self.feature_columns)?;
        write_json(&dir.join(&files.model_target_mean), &self.model_target_mean)?;
        if let Some(brand) = &self.brand_target_mean {
            write_json(&dir.join(&files.brand_target_mean), brand)?;
        }
        write_json(&dir.join(&files.global_mean), &self.global_mean)?;
        write_json(&dir.join(&files.scaler), &self.scaler)?;
        write_json(&dir.join(&files.model), &self.trees)?;
        Ok(())
    }
}

/// Validated, immutable encoding artifacts.
#[derive(Debug, Clone)]
pub struct EncodingArtifacts {
    source: Option<PathBuf>,
    manifest: BundleManifest,
    layout: FeatureLayout,
    encoders: TargetEncoders,
    global_mean: f64,
    scaler: NumericScaler,
    forest: Forest,
}

impl EncodingArtifacts {
    /// Load and validate the bundle in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let mut artifacts = Self::from_parts(BundleParts::read(dir)?)?;
        artifacts.source = Some(dir.to_path_buf());

        info!(
            bundle = %dir.display(),
            columns = artifacts.layout.len(),
            trees = artifacts.forest.n_trees(),
            brand_encoding = artifacts.manifest.brand_encoding.display_name(),
            "loaded artifact bundle"
        );
        Ok(artifacts)
    }

    /// Validate in-memory bundle contents.
    pub fn from_parts(parts: BundleParts) -> Result<Self, ArtifactError> {
        let BundleParts {
            manifest,
            feature_columns,
            model_target_mean,
            brand_target_mean,
            global_mean,
            scaler,
            trees,
        } = parts;

        if manifest.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::invalid(format!(
                "unsupported bundle format version {} (expected {SUPPORTED_FORMAT_VERSION})",
                manifest.format_version
            )));
        }
        if !global_mean.is_finite() {
            return Err(ArtifactError::invalid(format!("global mean {global_mean} is not finite")));
        }
        check_means("model", &model_target_mean)?;

        let brand = match (manifest.brand_encoding, brand_target_mean) {
            (BrandEncoding::TargetMean, Some(means)) => {
                check_means("brand", &means)?;
                Some(CategoricalEncoder::new("brand", means, global_mean))
            }
            (BrandEncoding::TargetMean, None) => {
                return Err(ArtifactError::invalid(
                    "brand_encoding is target_mean but no brand target-mean table was provided",
                ));
            }
            (BrandEncoding::OneHot, extra) => {
                if extra.is_some() {
                    debug!("ignoring brand target-mean table for a one-hot bundle");
                }
                None
            }
        };

        let scaler = NumericScaler::from_spec(scaler)?;
        let layout = FeatureLayout::new(feature_columns, &manifest.slots, &scaler, brand.is_some())?;
        let forest = Forest::from_dump(&trees, manifest.base_score, layout.columns())?;

        Ok(Self {
            source: None,
            encoders: TargetEncoders {
                model: CategoricalEncoder::new("model", model_target_mean, global_mean),
                brand,
            },
            manifest,
            layout,
            global_mean,
            scaler,
            forest,
        })
    }

    /// Ordered feature vector for a validated listing.
    pub fn encode(&self, listing: &ListingAttributes, reference_year: i32) -> Vec<f64> {
        self.layout.encode(listing, reference_year, &self.encoders, &self.scaler)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn encoders(&self) -> &TargetEncoders {
        &self.encoders
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn scaler(&self) -> &NumericScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }
}

fn check_means(feature: &str, means: &HashMap<String, f64>) -> Result<(), ArtifactError> {
    match means.iter().find(|(_, v)| !v.is_finite()) {
        Some((key, v)) => Err(ArtifactError::invalid(format!(
            "{feature} target mean for `{key}` is not finite ({v})"
        ))),
        None => Ok(()),
    }
}
