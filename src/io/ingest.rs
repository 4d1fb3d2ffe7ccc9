//! CSV ingest of listing batches.
//!
//! Turns a listings CSV into raw estimate requests, one per row. This module
//! does no field validation beyond CSV structure: cells are handed to the
//! estimator as text, exactly like form fields, and the estimator decides what
//! is missing or malformed.
//!
//! - **Strict schema** for the required columns (clear errors + exit code 2)
//! - **Row-level isolation**: a broken row is recorded and skipped
//! - Empty cells are absent fields

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde_json::Value;

use crate::domain::RawListingAttributes;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 4] = ["brand", "model", "year", "mileage"];
/// Training-data name for `mileage`.
const MILEAGE_ALIAS: &str = "km_driven";

/// One listing read from the CSV.
#[derive(Debug, Clone)]
pub struct ListingRow {
    /// 1-based line number in the file (the header is line 1).
    pub line: usize,
    pub id: Option<String>,
    pub raw: RawListingAttributes,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedListings {
    pub rows: Vec<ListingRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load listings from a CSV file.
pub fn load_listings(path: &Path) -> Result<IngestedListings, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_listings(file)
}

/// Load listings from any CSV source.
pub fn read_listings<R: Read>(source: R) -> Result<IngestedListings, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in REQUIRED_COLUMNS {
        let aliased = column == "mileage" && header_map.contains_key(MILEAGE_ALIAS);
        if !header_map.contains_key(column) && !aliased {
            return Err(AppError::new(2, format!("Missing required column: `{column}`")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(record) => rows.push(ListingRow {
                line,
                id: get_optional(&record, &header_map, "id").map(str::to_string),
                raw: parse_row(&record, &header_map),
            }),
            Err(e) => row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(IngestedListings {
        rows,
        row_errors,
        rows_read,
    })
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> RawListingAttributes {
    let cell = |name: &str| get_optional(record, header_map, name).map(|s| Value::String(s.to_string()));

    RawListingAttributes {
        brand: cell("brand"),
        model: cell("model"),
        year: cell("year"),
        mileage: cell("mileage").or_else(|| cell(MILEAGE_ALIAS)),
        engine_capacity: cell("engine_capacity"),
        transmission: cell("transmission"),
        fuel_type: cell("fuel_type"),
        ownership: cell("ownership"),
        spare_key: cell("spare_key"),
    }
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    header_map
        .get(name)
        .and_then(|&idx| record.get(idx))
        .filter(|s| !s.is_empty())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}
