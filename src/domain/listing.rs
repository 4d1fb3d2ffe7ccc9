//! Validation of raw listing attributes.
//!
//! Coercion rules follow what a form-backed caller actually sends: numbers may
//! arrive as JSON numbers or as numeric strings, and categorical values as
//! strings or bare numbers (e.g. a model called `3`).

use serde_json::Value;

use crate::domain::{ListingAttributes, RawListingAttributes};
use crate::error::EstimateError;

impl ListingAttributes {
    /// Validate a raw request.
    ///
    /// `brand`, `model`, `year` and `mileage` are always required.
    /// `engine_capacity` is required only when `requires_engine_capacity` is set
    /// (i.e. the active artifact bundle consumes it).
    pub fn from_raw(raw: &RawListingAttributes, requires_engine_capacity: bool) -> Result<Self, EstimateError> {
        let brand = parse_text("brand", required("brand", &raw.brand)?)?;
        let model = parse_text("model", required("model", &raw.model)?)?;
        let year = parse_year(required("year", &raw.year)?)?;
        let mileage = parse_quantity("mileage", required("mileage", &raw.mileage)?)?;

        let engine_capacity = match present(&raw.engine_capacity) {
            Some(v) => Some(parse_quantity("engine_capacity", v)?),
            None if requires_engine_capacity => return Err(EstimateError::MissingField("engine_capacity")),
            None => None,
        };

        let transmission = present(&raw.transmission)
            .map(|v| parse_text("transmission", v))
            .transpose()?;
        let fuel_type = present(&raw.fuel_type)
            .map(|v| parse_text("fuel_type", v))
            .transpose()?;
        let ownership = present(&raw.ownership)
            .map(|v| parse_text("ownership", v))
            .transpose()?;

        let spare_key = match present(&raw.spare_key) {
            Some(v) => parse_spare_key(v)?,
            None => 1,
        };

        Ok(Self {
            brand,
            model,
            year,
            mileage,
            engine_capacity,
            transmission,
            fuel_type,
            ownership,
            spare_key,
        })
    }
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn required<'a>(field: &'static str, value: &'a Option<Value>) -> Result<&'a Value, EstimateError> {
    present(value).ok_or(EstimateError::MissingField(field))
}

fn parse_text(field: &'static str, value: &Value) -> Result<String, EstimateError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(EstimateError::type_conversion(
            field,
            format!("expected text, got {}", describe(other)),
        )),
    }
}

fn parse_year(value: &Value) -> Result<i32, EstimateError> {
    const FIELD: &str = "year";
    let year = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                    .map(|f| f as i32)
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };

    year.ok_or_else(|| EstimateError::type_conversion(FIELD, format!("expected an integer year, got {}", describe(value))))
}

/// Parse a non-negative, finite quantity (mileage, engine capacity).
fn parse_quantity(field: &'static str, value: &Value) -> Result<f64, EstimateError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(v) = parsed.filter(|v| v.is_finite()) else {
        return Err(EstimateError::type_conversion(
            field,
            format!("expected a number, got {}", describe(value)),
        ));
    };
    if v < 0.0 {
        return Err(EstimateError::invalid_value(field, format!("must be >= 0, got {v}")));
    }
    Ok(v)
}

fn parse_spare_key(value: &Value) -> Result<u8, EstimateError> {
    const FIELD: &str = "spare_key";
    let parsed = match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v == 0.0 => Ok(0),
        Some(v) if v == 1.0 => Ok(1),
        Some(v) => Err(EstimateError::invalid_value(FIELD, format!("must be 0 or 1, got {v}"))),
        None => Err(EstimateError::type_conversion(
            FIELD,
            format!("expected 0 or 1, got {}", describe(value)),
        )),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Number(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawListingAttributes {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_numeric_strings_and_defaults_spare_key() {
        let listing = ListingAttributes::from_raw(
            &raw(json!({"brand": "Toyota", "model": "Corolla", "year": " 2020 ", "mileage": "50000.5"})),
            false,
        )
        .unwrap();
        assert_eq!(listing.year, 2020);
        assert_eq!(listing.mileage, 50000.5);
        assert_eq!(listing.spare_key, 1);
        assert_eq!(listing.engine_capacity, None);
        assert_eq!(listing.transmission, None);
    }

    #[test]
    fn numeric_model_names_become_text() {
        let listing = ListingAttributes::from_raw(
            &raw(json!({"brand": "Mazda", "model": 3, "year": 2018.0, "mileage": 1})),
            false,
        )
        .unwrap();
        assert_eq!(listing.model, "3");
        assert_eq!(listing.year, 2018);
    }

    #[test]
    fn missing_required_fields_are_reported_in_order() {
        let err = ListingAttributes::from_raw(&raw(json!({"model": "Corolla"})), false).unwrap_err();
        assert_eq!(err, EstimateError::MissingField("brand"));

        let err = ListingAttributes::from_raw(
            &raw(json!({"brand": "Toyota", "model": "Corolla", "year": null, "mileage": 10})),
            false,
        )
        .unwrap_err();
        assert_eq!(err, EstimateError::MissingField("year"));
    }

    #[test]
    fn engine_capacity_required_only_when_consumed() {
        let input = raw(json!({"brand": "Toyota", "model": "Corolla", "year": 2020, "mileage": 10}));
        assert!(ListingAttributes::from_raw(&input, false).is_ok());
        assert_eq!(
            ListingAttributes::from_raw(&input, true).unwrap_err(),
            EstimateError::MissingField("engine_capacity")
        );
    }

    #[test]
    fn wrong_types_are_type_conversion_errors() {
        let base = json!({"brand": "Toyota", "model": "Corolla", "year": 2020, "mileage": 10});

        let mut v = base.clone();
        v["year"] = json!("twenty-twenty");
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "year", .. })
        ));

        let mut v = base.clone();
        v["year"] = json!(2020.5);
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "year", .. })
        ));

        let mut v = base.clone();
        v["mileage"] = json!("NaN");
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "mileage", .. })
        ));

        let mut v = base.clone();
        v["brand"] = json!(true);
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "brand", .. })
        ));

        let mut v = base;
        v["engine_capacity"] = json!([1800]);
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "engine_capacity", .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let base = json!({"brand": "Toyota", "model": "Corolla", "year": 2020, "mileage": 10});

        let mut v = base.clone();
        v["mileage"] = json!(-1);
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::InvalidValue { field: "mileage", .. })
        ));

        let mut v = base.clone();
        v["spare_key"] = json!(2);
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::InvalidValue { field: "spare_key", .. })
        ));

        let mut v = base;
        v["spare_key"] = json!("yes");
        assert!(matches!(
            ListingAttributes::from_raw(&raw(v), false),
            Err(EstimateError::TypeConversion { field: "spare_key", .. })
        ));
    }

    #[test]
    fn future_year_is_accepted() {
        let listing = ListingAttributes::from_raw(
            &raw(json!({"brand": "Toyota", "model": "Corolla", "year": 2031, "mileage": 0, "spare_key": false})),
            false,
        )
        .unwrap();
        assert_eq!(listing.year, 2031);
        assert_eq!(listing.spare_key, 0);
    }
}
