//! CSV exports.
//!
//! - batch results (`write_results_csv`), easy to consume in spreadsheets or downstream scripts
//! - raw listings (`write_listings_csv`), in the layout `price batch` reads back

use std::path::Path;

use serde_json::Value;

use crate::domain::{BatchOutcome, RawListingAttributes};
use crate::error::AppError;

/// Write per-listing results to a CSV file.
pub fn write_results_csv(path: &Path, outcomes: &[BatchOutcome]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(&mut writer, outcomes)?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))
}

fn write_results<W: std::io::Write>(writer: &mut csv::Writer<W>, outcomes: &[BatchOutcome]) -> Result<(), AppError> {
    writer
        .write_record(["line", "id", "brand", "model", "year", "success", "price", "error"])
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for o in outcomes {
        let r = &o.request;
        writer
            .write_record([
                o.line.to_string(),
                o.id.clone().unwrap_or_default(),
                cell_text(&r.brand),
                cell_text(&r.model),
                cell_text(&r.year),
                o.response.success.to_string(),
                o.response.price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                o.response.error.clone().unwrap_or_default(),
            ])
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

/// Write raw listings with a 1-based `id` column.
pub fn write_listings_csv(path: &Path, listings: &[RawListingAttributes]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create listings CSV '{}': {e}", path.display())))?;
    write_listings(&mut writer, listings)?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush listings CSV: {e}")))
}

fn write_listings<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    listings: &[RawListingAttributes],
) -> Result<(), AppError> {
    writer
        .write_record([
            "id",
            "brand",
            "model",
            "year",
            "mileage",
            "engine_capacity",
            "transmission",
            "fuel_type",
            "ownership",
            "spare_key",
        ])
        .map_err(|e| AppError::new(4, format!("Failed to write listings CSV header: {e}")))?;

    for (i, r) in listings.iter().enumerate() {
        writer
            .write_record([
                (i + 1).to_string(),
                cell_text(&r.brand),
                cell_text(&r.model),
                cell_text(&r.year),
                cell_text(&r.mileage),
                cell_text(&r.engine_capacity),
                cell_text(&r.transmission),
                cell_text(&r.fuel_type),
                cell_text(&r.ownership),
                cell_text(&r.spare_key),
            ])
            .map_err(|e| AppError::new(4, format!("Failed to write listings CSV row: {e}")))?;
    }
    Ok(())
}

fn cell_text(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EstimateResponse, RawListingAttributes};
    use serde_json::json;

    #[test]
    fn writes_one_row_per_outcome_with_quoting() {
        let request: RawListingAttributes =
            serde_json::from_value(json!({"brand": "Toyota", "model": "Corolla", "year": 2020})).unwrap();
        let outcomes = vec![
            BatchOutcome {
                line: 2,
                id: Some("a1".to_string()),
                request: request.clone(),
                response: EstimateResponse::ok(15050.1),
            },
            BatchOutcome {
                line: 3,
                id: None,
                request,
                response: EstimateResponse::failure("field `mileage` is out of range: must be >= 0, got -1"),
            },
        ];

        let mut writer = csv::Writer::from_writer(Vec::new());
        write_results(&mut writer, &outcomes).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "line,id,brand,model,year,success,price,error");
        assert_eq!(lines[1], "2,a1,Toyota,Corolla,2020,true,15050.10,");
        assert_eq!(
            lines[2],
            "3,,Toyota,Corolla,2020,false,,\"field `mileage` is out of range: must be >= 0, got -1\""
        );
    }

    #[test]
    fn written_listings_read_back_through_ingest() {
        let listings: Vec<RawListingAttributes> = vec![
            serde_json::from_value(json!({
                "brand": "Honda", "model": "Civic", "year": 2019, "mileage": 42000.0,
                "transmission": "Manual", "spare_key": 0
            }))
            .unwrap(),
            serde_json::from_value(json!({"brand": "Ford", "model": "Fiesta", "year": 2015, "mileage": 90000})).unwrap(),
        ];

        let mut writer = csv::Writer::from_writer(Vec::new());
        write_listings(&mut writer, &listings).unwrap();
        let bytes = writer.into_inner().unwrap();

        let ingested = crate::io::read_listings(bytes.as_slice()).unwrap();
        assert_eq!(ingested.rows.len(), 2);
        assert!(ingested.row_errors.is_empty());

        let first = &ingested.rows[0];
        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(first.raw.model, Some(json!("Civic")));
        assert_eq!(first.raw.mileage, Some(json!("42000.0")));
        assert_eq!(first.raw.spare_key, Some(json!("0")));
        assert_eq!(ingested.rows[1].raw.spare_key, None);
        assert_eq!(ingested.rows[1].raw.engine_capacity, None);
    }
}
