use std::collections::BTreeMap;

use arrow::array::{Array, AsArray};
use arrow::datatypes::Float64Type;
use places_etl::transform::{ANONYMIZED_COLUMNS, LAT_COLUMN, PROVINCE_COLUMN, UNKNOWN_PROVINCE};
use places_etl::{BRAND_COLUMN, PARTITION_COLUMN, PipelineError, read_partitioned, run};

use serde_json::json;

use crate::utils::{ah_records, jumbo_records, test_config, write_brand_file};

#[test]
fn test_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "jumbo", "lidl"]);
    write_brand_file(&config.input_dir, "ah", &ah_records());
    write_brand_file(&config.input_dir, "jumbo", &jumbo_records());

    let report = run(&config).unwrap();
    assert_eq!(report.loaded_brands(), vec!["ah", "jumbo"]);
    assert_eq!(report.failed_brands(), vec!["lidl"]);
    assert_eq!(report.rows, 5);
    // 1012LG, 3511BD, 9711LM and the default partition
    assert_eq!(report.write.partitions, 4);

    let dataset = read_partitioned(&config.output_dir, PARTITION_COLUMN).unwrap();
    assert_eq!(dataset.num_rows(), 5);

    let codes = dataset.column_by_name(PARTITION_COLUMN).unwrap().as_string::<i32>();
    let provinces = dataset.column_by_name(PROVINCE_COLUMN).unwrap().as_string::<i32>();
    let brands = dataset.column_by_name(BRAND_COLUMN).unwrap().as_string::<i32>();

    let mut by_code: BTreeMap<Option<&str>, Vec<(&str, &str)>> = BTreeMap::new();
    for i in 0..dataset.num_rows() {
        let code = codes.is_valid(i).then(|| codes.value(i));
        by_code
            .entry(code)
            .or_default()
            .push((brands.value(i), provinces.value(i)));
    }

    let mut amsterdam = by_code[&Some("1012LG")].clone();
    amsterdam.sort();
    assert_eq!(
        amsterdam,
        vec![("ah", "Noord-Holland"), ("jumbo", "Noord-Holland")]
    );
    assert_eq!(by_code[&Some("3511BD")], vec![("ah", "Utrecht")]);
    assert_eq!(by_code[&Some("9711LM")], vec![("jumbo", "Groningen")]);
    assert_eq!(by_code[&None], vec![("jumbo", UNKNOWN_PROVINCE)]);

    for column in ANONYMIZED_COLUMNS {
        let values = dataset.column_by_name(column).unwrap().as_string::<i32>();
        assert!(values.iter().all(|v| v == Some(config.anonymization_marker.as_str())));
    }

    let address = dataset.column_by_name("address").unwrap().as_struct();
    let street = address.column_by_name("street").unwrap().as_string::<i32>();
    assert!(
        street
            .iter()
            .all(|v| v.is_none() || v == Some(config.anonymization_marker.as_str()))
    );

    let lat = dataset.column_by_name(LAT_COLUMN).unwrap().as_primitive::<Float64Type>();
    assert_eq!(lat.null_count(), 1);
}

#[test]
fn test_run_with_empty_nested_objects() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah"]);
    let records = json!([
        {"name": "AH Damrak", "address": {}, "placeSearchOpeningHours": [{}]},
        {"name": "AH Vredenburg", "address": {}, "placeSearchOpeningHours": [{}, {}]}
    ]);
    write_brand_file(&config.input_dir, "ah", &records);

    let report = run(&config).unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.write.partitions, 1);

    let dataset = read_partitioned(&config.output_dir, PARTITION_COLUMN).unwrap();
    assert_eq!(dataset.num_rows(), 2);
    assert!(dataset.column_by_name("address").is_none());
    assert!(dataset.column_by_name("placeSearchOpeningHours").is_none());
    assert_eq!(dataset.column_by_name(PARTITION_COLUMN).unwrap().null_count(), 2);

    let provinces = dataset.column_by_name(PROVINCE_COLUMN).unwrap().as_string::<i32>();
    assert!(provinces.iter().all(|p| p == Some(UNKNOWN_PROVINCE)));
    for column in ANONYMIZED_COLUMNS {
        let values = dataset.column_by_name(column).unwrap().as_string::<i32>();
        assert!(values.iter().all(|v| v == Some(config.anonymization_marker.as_str())));
    }
}

#[test]
fn test_run_merges_empty_address_with_other_brands() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "jumbo"]);
    let records = json!([{"name": "AH Damrak", "address": {}, "placeSearchOpeningHours": [{}]}]);
    write_brand_file(&config.input_dir, "ah", &records);
    write_brand_file(&config.input_dir, "jumbo", &jumbo_records());

    let report = run(&config).unwrap();
    assert_eq!(report.rows, 4);

    let dataset = read_partitioned(&config.output_dir, PARTITION_COLUMN).unwrap();
    assert_eq!(dataset.num_rows(), 4);
    let address = dataset.column_by_name("address").unwrap().as_struct();
    assert!(address.column_by_name("city").is_some());
    assert!(dataset.column_by_name("placeSearchOpeningHours").is_none());
}

#[test]
fn test_run_without_any_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path()).with_brands(["ah", "jumbo"]);

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::NoData(_)));
    assert!(!config.output_dir.exists());
}
