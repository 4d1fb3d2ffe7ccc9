//! Fitted affine scalers for numeric features.
//!
//! Both scaler kinds the training pipeline uses are affine per column, so we
//! normalise them into a single form:
//!
//! ```text
//! y = x ∘ factor + offset
//! ```
//!
//! - standard (`StandardScaler`): `y = (x - mean) / scale`, so `factor = 1/scale`, `offset = -mean/scale`
//! - min-max (`MinMaxScaler`): `y = x * scale + min`, so `factor = scale`, `offset = min`

use std::collections::HashSet;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// Scaler parameters as exported by the training pipeline (`scaler.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    Standard {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    MinMax {
        columns: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl ScalerSpec {
    pub fn columns(&self) -> &[String] {
        match self {
            ScalerSpec::Standard { columns, .. } | ScalerSpec::MinMax { columns, .. } => columns,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ScalerSpec::Standard { .. } => "standard",
            ScalerSpec::MinMax { .. } => "min-max",
        }
    }
}

/// A validated scaler ready to transform feature tuples.
#[derive(Debug, Clone)]
pub struct NumericScaler {
    spec: ScalerSpec,
    factor: DVector<f64>,
    offset: DVector<f64>,
}

impl NumericScaler {
    pub fn from_spec(spec: ScalerSpec) -> Result<Self, ArtifactError> {
        let (columns, factor, offset) = match &spec {
            ScalerSpec::Standard { columns, mean, scale } => {
                check_lengths(columns, &[("mean", mean), ("scale", scale)])?;
                let mut factor = Vec::with_capacity(columns.len());
                let mut offset = Vec::with_capacity(columns.len());
                for ((col, &m), &s) in columns.iter().zip(mean).zip(scale) {
                    if !(m.is_finite() && s.is_finite()) || s == 0.0 {
                        return Err(ArtifactError::invalid(format!(
                            "scaler column `{col}` has unusable parameters (mean={m}, scale={s})"
                        )));
                    }
                    factor.push(1.0 / s);
                    offset.push(-m / s);
                }
                (columns, factor, offset)
            }
            ScalerSpec::MinMax { columns, min, scale } => {
                check_lengths(columns, &[("min", min), ("scale", scale)])?;
                if let Some((col, _)) = columns
                    .iter()
                    .zip(min.iter().zip(scale))
                    .find(|(_, (m, s))| !(m.is_finite() && s.is_finite()))
                {
                    return Err(ArtifactError::invalid(format!(
                        "scaler column `{col}` has non-finite parameters"
                    )));
                }
                (columns, scale.clone(), min.clone())
            }
        };

        if columns.is_empty() {
            return Err(ArtifactError::invalid("scaler has no columns"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ArtifactError::invalid(format!("scaler column `{dup}` is listed twice")));
        }

        Ok(Self {
            factor: DVector::from_vec(factor),
            offset: DVector::from_vec(offset),
            spec,
        })
    }

    /// Input column order expected by [`NumericScaler::transform`].
    pub fn columns(&self) -> &[String] {
        self.spec.columns()
    }

    pub fn spec(&self) -> &ScalerSpec {
        &self.spec
    }

    /// Scale one tuple of raw values given in [`NumericScaler::columns`] order.
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the number of scaler columns. The
    /// feature layout resolves the scaler columns once at load time, so callers
    /// always pass a correctly sized tuple.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        assert_eq!(values.len(), self.factor.len(), "scaler input length mismatch");
        let x = DVector::from_column_slice(values);
        let y = x.component_mul(&self.factor) + &self.offset;
        y.iter().copied().collect()
    }
}

fn check_lengths(columns: &[String], params: &[(&str, &Vec<f64>)]) -> Result<(), ArtifactError> {
    for (name, values) in params {
        if values.len() != columns.len() {
            return Err(ArtifactError::invalid(format!(
                "scaler `{name}` has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn standard_scaler_matches_definition() {
        let scaler = NumericScaler::from_spec(ScalerSpec::Standard {
            columns: cols(&["engine_capacity", "km_driven", "age"]),
            mean: vec![1500.0, 60_000.0, 6.0],
            scale: vec![300.0, 20_000.0, 2.0],
        })
        .unwrap();

        let y = scaler.transform(&[1800.0, 50_000.0, 5.0]);
        assert!((y[0] - 1.0).abs() < 1e-12);
        assert!((y[1] + 0.5).abs() < 1e-12);
        assert!((y[2] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn min_max_scaler_matches_definition() {
        let scaler = NumericScaler::from_spec(ScalerSpec::MinMax {
            columns: cols(&["age"]),
            min: vec![-0.1],
            scale: vec![0.05],
        })
        .unwrap();
        let y = scaler.transform(&[4.0]);
        assert!((y[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_scale_and_length_mismatch() {
        let zero = ScalerSpec::Standard {
            columns: cols(&["age"]),
            mean: vec![1.0],
            scale: vec![0.0],
        };
        assert!(NumericScaler::from_spec(zero).is_err());

        let short = ScalerSpec::Standard {
            columns: cols(&["age", "km_driven"]),
            mean: vec![1.0],
            scale: vec![1.0, 1.0],
        };
        assert!(NumericScaler::from_spec(short).is_err());
    }

    #[test]
    fn rejects_duplicate_columns() {
        let dup = ScalerSpec::MinMax {
            columns: cols(&["age", "age"]),
            min: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
        };
        assert!(NumericScaler::from_spec(dup).is_err());
    }
}
