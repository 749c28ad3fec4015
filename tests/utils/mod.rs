//! Shared fixtures for integration tests

use std::fs;
use std::path::Path;

use places_etl::PipelineConfig;
use serde_json::{Value, json};

/// AH-style records: flat address object with `street`
pub fn ah_records() -> Value {
    json!([
        {
            "name": "AH Damrak",
            "address": {
                "street": "Damrak",
                "houseNumber": "1",
                "postalCode": "1012 LG",
                "city": "Amsterdam"
            },
            "geoCoordinates": {"latitude": 52.3759, "longitude": 4.8966},
            "handoverServices": ["PICKUP", "DELIVERY"],
            "placeSearchOpeningHours": [{"date": "2024-05-01", "opens": "08:00", "closes": "22:00"}]
        },
        {
            "name": "AH Vredenburg",
            "address": {
                "street": "Vredenburg",
                "houseNumber": "40",
                "postalCode": "3511 BD",
                "city": "Utrecht"
            },
            "geoCoordinates": {"latitude": 52.0923, "longitude": 5.1146},
            "handoverServices": [],
            "placeSearchOpeningHours": []
        }
    ])
}

/// Jumbo-style records: top-level street fields, numeric house numbers,
/// string coordinates and a record without a postal code
pub fn jumbo_records() -> Value {
    json!([
        {
            "name": "Jumbo Groningen",
            "streetName": "Herestraat",
            "houseNumber": 10,
            "address": {"postalCode": "9711lm", "city": "Groningen"},
            "geoCoordinates": {"latitude": "53.2153", "longitude": "6.5665"},
            "storeType": "supermarket"
        },
        {
            "name": "Jumbo Pop-up",
            "streetName": "Onbekend",
            "houseNumber": 3,
            "address": {"city": "Nowhere"},
            "geoCoordinates": null,
            "storeType": "pop-up"
        },
        {
            "name": "Jumbo Damrak",
            "streetName": "Damrak",
            "houseNumber": 7,
            "address": {"postalCode": "1012LG", "city": "Amsterdam"},
            "geoCoordinates": {"latitude": "52.3761", "longitude": "4.8960"},
            "storeType": "city"
        }
    ])
}

/// Write `records` as `<brand>-places.json` in `dir`
pub fn write_brand_file(dir: &Path, brand: &str, records: &Value) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join(format!("{brand}-places.json")),
        serde_json::to_vec_pretty(records).unwrap(),
    )
    .unwrap();
}

/// Config pointing at `root/raw` and `root/out`, without progress output
pub fn test_config(root: &Path) -> PipelineConfig {
    PipelineConfig::new(root.join("raw"), root.join("out"))
        .with_progress(false)
        .with_threads(2)
}
