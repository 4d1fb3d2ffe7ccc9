//! Hand-built artifact bundle shared by unit tests.
//!
//! Small enough to evaluate by hand. For the Toyota Corolla listing
//! (reference year 2025) the forest yields:
//!
//! ```text
//! base 500 + tree0 13500 (model mean 14000 >= 12000)
//!          + tree1 1200.25 (scaled age -0.5 < 0, scaled km -0.5 < 1)
//!          + tree2 -150.126 (transmission_Manual = 1)
//!          = 15050.124 -> 15050.12
//! ```

use std::collections::HashMap;

use serde_json::json;

use crate::artifacts::{BundleManifest, BundleParts, EncodingArtifacts};
use crate::domain::{BrandEncoding, ListingAttributes, RawListingAttributes};
use crate::math::ScalerSpec;
use crate::models::DumpNode;

pub const FIXTURE_YEAR: i32 = 2025;
pub const COROLLA_PRICE: f64 = 15_050.12;
pub const UNSEEN_PRICE: f64 = 10_550.12;

pub fn fixture_parts() -> BundleParts {
    let feature_columns = [
        "engine_capacity",
        "km_driven",
        "age",
        "spare_key",
        "model",
        "brand_Honda",
        "brand_Toyota",
        "transmission_Automatic",
        "transmission_Manual",
        "fuel_type_Diesel",
        "fuel_type_Petrol",
        "ownership_1st owner",
        "ownership_2nd owner",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let trees: Vec<DumpNode> = serde_json::from_value(json!([
        {
            "nodeid": 0, "depth": 0, "split": "model", "split_condition": 12000.0,
            "yes": 1, "no": 2, "missing": 1,
            "children": [{"nodeid": 1, "leaf": 9000.0}, {"nodeid": 2, "leaf": 13500.0}]
        },
        {
            "nodeid": 0, "depth": 0, "split": "age", "split_condition": 0.0,
            "yes": 1, "no": 2, "missing": 1,
            "children": [
                {
                    "nodeid": 1, "depth": 1, "split": "km_driven", "split_condition": 1.0,
                    "yes": 3, "no": 4, "missing": 3,
                    "children": [{"nodeid": 3, "leaf": 1200.25}, {"nodeid": 4, "leaf": 300.0}]
                },
                {"nodeid": 2, "leaf": -800.0}
            ]
        },
        {
            "nodeid": 0, "depth": 0, "split": "transmission_Manual", "split_condition": 0.5,
            "yes": 1, "no": 2, "missing": 1,
            "children": [{"nodeid": 1, "leaf": 250.0}, {"nodeid": 2, "leaf": -150.126}]
        }
    ]))
    .expect("fixture trees");

    let mut manifest = BundleManifest::new(BrandEncoding::OneHot);
    manifest.base_score = 500.0;

    BundleParts {
        manifest,
        feature_columns,
        model_target_mean: HashMap::from([
            ("Corolla".to_string(), 14_000.0),
            ("Civic".to_string(), 13_000.0),
            ("City".to_string(), 9_000.0),
        ]),
        brand_target_mean: None,
        global_mean: 10_000.0,
        scaler: ScalerSpec::Standard {
            columns: vec!["engine_capacity".to_string(), "km_driven".to_string(), "age".to_string()],
            mean: vec![1500.0, 60_000.0, 6.0],
            scale: vec![300.0, 20_000.0, 2.0],
        },
        trees,
    }
}

pub fn fixture_artifacts() -> EncodingArtifacts {
    EncodingArtifacts::from_parts(fixture_parts()).expect("fixture bundle is valid")
}

pub fn corolla_listing() -> ListingAttributes {
    ListingAttributes {
        brand: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2020,
        mileage: 50_000.0,
        engine_capacity: Some(1800.0),
        transmission: Some("Manual".to_string()),
        fuel_type: Some("Petrol".to_string()),
        ownership: Some("1st owner".to_string()),
        spare_key: 1,
    }
}

pub fn corolla_request() -> RawListingAttributes {
    serde_json::from_value(json!({
        "brand": "Toyota",
        "model": "Corolla",
        "year": 2020,
        "mileage": 50000,
        "engine_capacity": 1800,
        "transmission": "Manual",
        "fuel_type": "Petrol",
        "ownership": "1st owner",
        "spare_key": 1
    }))
    .expect("fixture request")
}
