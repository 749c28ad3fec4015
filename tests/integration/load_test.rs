use arrow::array::AsArray;
use places_etl::{BRAND_COLUMN, PipelineError, load_all, load_brand, union_frames};

use crate::utils::{ah_records, jumbo_records, test_config, write_brand_file};

#[test]
fn test_load_unknown_brand() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let err = load_brand(&config, "spar").unwrap_err();
    assert!(matches!(err, PipelineError::InvalidBrand { .. }));
    assert!(err.to_string().starts_with("Invalid brand 'spar'. Must be one of: "));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let err = load_brand(&config, "lidl").unwrap_err();
    assert!(matches!(err, PipelineError::FileNotFound { .. }));
    assert!(err.to_string().starts_with("File not found: "));
    assert!(err.to_string().ends_with("lidl-places.json"));
}

#[test]
fn test_load_adds_brand_column() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    write_brand_file(&config.input_dir, "ah", &ah_records());

    let batch = load_brand(&config, "ah").unwrap();
    assert_eq!(batch.num_rows(), 2);

    let brands = batch.column_by_name(BRAND_COLUMN).unwrap().as_string::<i32>();
    assert!(brands.iter().all(|b| b == Some("ah")));
}

#[test]
fn test_load_all_keeps_failures_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "jumbo", "plus", "spar"]);
    write_brand_file(&config.input_dir, "ah", &ah_records());
    write_brand_file(&config.input_dir, "jumbo", &jumbo_records());

    let frames = load_all(&config);
    assert_eq!(frames.len(), 4);
    assert!(frames["ah"].is_some());
    assert!(frames["jumbo"].is_some());
    assert!(frames["plus"].is_none());
    assert!(frames["spar"].is_none());
}

#[test]
fn test_load_all_loads_case_variants_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "AH", " Ah "]);
    write_brand_file(
        &config.input_dir,
        "ah",
        &serde_json::json!([{"name": "AH Damrak", "address": {"postalCode": "1012 LG"}}]),
    );

    let frames = load_all(&config);
    assert_eq!(frames.keys().collect::<Vec<_>>(), vec!["ah"]);

    let unioned = union_frames(&frames).unwrap();
    assert_eq!(unioned.num_rows(), 1);
}

#[test]
fn test_union_frames_superset_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "jumbo"]);
    write_brand_file(&config.input_dir, "ah", &ah_records());
    write_brand_file(&config.input_dir, "jumbo", &jumbo_records());

    let frames = load_all(&config);
    let unioned = union_frames(&frames).unwrap();
    assert_eq!(unioned.num_rows(), 5);

    // Columns only one brand has are present and null for the other
    let store_type = unioned.column_by_name("storeType").unwrap();
    assert_eq!(store_type.null_count(), 2);
    let opening_hours = unioned.column_by_name("placeSearchOpeningHours").unwrap();
    assert_eq!(opening_hours.null_count(), 3);

    // The address objects are merged child by child
    let address = unioned.column_by_name("address").unwrap().as_struct();
    assert!(address.column_by_name("street").is_some());
    assert!(address.column_by_name("city").is_some());
}

#[test]
fn test_union_frames_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah"]);

    let frames = load_all(&config);
    assert!(matches!(union_frames(&frames), Err(PipelineError::NoData(_))));
}
