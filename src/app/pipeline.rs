//! Shared estimation pipeline used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load bundle -> build estimator -> ingest listings -> estimate (in parallel) -> summarize
//!
//! The command handlers can then focus on presentation (printing vs exporting).

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::artifacts::EncodingArtifacts;
use crate::domain::{BatchOutcome, EstimatorConfig};
use crate::error::AppError;
use crate::estimate::PriceEstimator;
use crate::io::ingest::{IngestedListings, ListingRow, load_listings};
use crate::report::{BatchSummary, summarize_batch};

/// All computed outputs of a single `price batch` run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub ingest: IngestedListings,
    pub outcomes: Vec<BatchOutcome>,
    pub summary: BatchSummary,
}

/// Load the bundle in `dir` and wrap it in an estimator.
///
/// A bundle that fails to load is fatal: nothing is estimated.
pub fn load_estimator(dir: &Path, reference_year: Option<i32>) -> Result<PriceEstimator, AppError> {
    let artifacts = EncodingArtifacts::load(dir)?;
    let config = reference_year.map_or_else(EstimatorConfig::current, EstimatorConfig::new);
    Ok(PriceEstimator::new(Arc::new(artifacts), config))
}

/// Estimate every row, in parallel, keeping input order.
///
/// Row failures are isolated: each one becomes a failure response.
pub fn run_batch(estimator: &PriceEstimator, rows: &[ListingRow]) -> Vec<BatchOutcome> {
    rows.par_iter()
        .map(|row| BatchOutcome {
            line: row.line,
            id: row.id.clone(),
            request: row.raw.clone(),
            response: estimator.respond(&row.raw),
        })
        .collect()
}

/// Ingest a listings CSV and estimate it.
pub fn run_batch_file(estimator: &PriceEstimator, path: &Path) -> Result<BatchRun, AppError> {
    let ingest = load_listings(path)?;
    let outcomes = run_batch(estimator, &ingest.rows);
    let summary = summarize_batch(ingest.rows_read, &outcomes, &ingest.row_errors);

    info!(
        input = %path.display(),
        rows = summary.rows_read,
        ok = summary.succeeded,
        failed = summary.failed,
        unreadable = summary.unreadable,
        "batch complete"
    );

    Ok(BatchRun {
        ingest,
        outcomes,
        summary,
    })
}
