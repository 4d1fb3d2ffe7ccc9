//! Reporting utilities: batch statistics and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::HashMap;

use crate::domain::BatchOutcome;
use crate::io::RowError;

/// Aggregate view of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub rows_read: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Rows the CSV reader could not parse at all.
    pub unreadable: usize,
    pub price_min: Option<f64>,
    pub price_median: Option<f64>,
    pub price_max: Option<f64>,
    /// Distinct failure messages, most frequent first.
    pub failure_reasons: Vec<(String, usize)>,
}

/// Summarize per-row outcomes.
pub fn summarize_batch(rows_read: usize, outcomes: &[BatchOutcome], row_errors: &[RowError]) -> BatchSummary {
    let mut prices: Vec<f64> = outcomes.iter().filter_map(|o| o.response.price).collect();
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut reasons: HashMap<&str, usize> = HashMap::new();
    for o in outcomes.iter().filter(|o| !o.response.success) {
        *reasons.entry(o.response.error.as_deref().unwrap_or("unknown error")).or_default() += 1;
    }
    let mut failure_reasons: Vec<(String, usize)> = reasons.into_iter().map(|(r, n)| (r.to_string(), n)).collect();
    failure_reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let succeeded = outcomes.iter().filter(|o| o.response.success).count();

    BatchSummary {
        rows_read,
        succeeded,
        failed: outcomes.len() - succeeded,
        unreadable: row_errors.len(),
        price_min: prices.first().copied(),
        price_median: median(&prices),
        price_max: prices.last().copied(),
        failure_reasons,
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EstimateResponse, RawListingAttributes};

    fn outcome(line: usize, response: EstimateResponse) -> BatchOutcome {
        BatchOutcome {
            line,
            id: None,
            request: RawListingAttributes::default(),
            response,
        }
    }

    #[test]
    fn summarize_batch_counts_and_ranges() {
        let outcomes = vec![
            outcome(2, EstimateResponse::ok(300.0)),
            outcome(3, EstimateResponse::failure("missing required field `year`")),
            outcome(4, EstimateResponse::ok(100.0)),
            outcome(5, EstimateResponse::failure("missing required field `year`")),
            outcome(6, EstimateResponse::failure("missing required field `brand`")),
            outcome(7, EstimateResponse::ok(200.0)),
            outcome(8, EstimateResponse::ok(1000.0)),
        ];
        let row_errors = vec![RowError {
            line: 9,
            message: "CSV parse error".to_string(),
        }];

        let s = summarize_batch(8, &outcomes, &row_errors);
        assert_eq!(s.rows_read, 8);
        assert_eq!(s.succeeded, 4);
        assert_eq!(s.failed, 3);
        assert_eq!(s.unreadable, 1);
        assert_eq!(s.price_min, Some(100.0));
        assert_eq!(s.price_median, Some(250.0));
        assert_eq!(s.price_max, Some(1000.0));
        assert_eq!(s.failure_reasons[0], ("missing required field `year`".to_string(), 2));
        assert_eq!(s.failure_reasons[1], ("missing required field `brand`".to_string(), 1));
    }

    #[test]
    fn summarize_empty_batch() {
        let s = summarize_batch(0, &[], &[]);
        assert_eq!(s.succeeded, 0);
        assert_eq!(s.price_median, None);
        assert!(s.failure_reasons.is_empty());
    }
}
