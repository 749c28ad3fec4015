use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::datatypes::Int64Type;
use places_etl::io::parquet::SUCCESS_MARKER;
use places_etl::io::{DEFAULT_PARTITION_NAME, read_partitioned, write_partitioned};
use places_etl::{PARTITION_COLUMN, PipelineConfig, RecordBatch};

fn sample_batch() -> RecordBatch {
    let codes: ArrayRef = Arc::new(StringArray::from(vec![
        Some("1012LG"),
        Some("3511BD"),
        None,
        Some("1012LG"),
    ]));
    let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3, 4]));
    RecordBatch::try_from_iter(vec![("id", ids), (PARTITION_COLUMN, codes)]).unwrap()
}

#[test]
fn test_write_creates_one_directory_per_code() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dataset");
    let config = PipelineConfig::default().with_progress(false);

    let summary = write_partitioned(&sample_batch(), &out, PARTITION_COLUMN, &config).unwrap();
    assert_eq!(summary.partitions, 3);
    assert_eq!(summary.rows, 4);

    assert!(out.join("postal_code=1012LG/part-00000.parquet").is_file());
    assert!(out.join("postal_code=3511BD/part-00000.parquet").is_file());
    assert!(
        out.join(format!("postal_code={DEFAULT_PARTITION_NAME}/part-00000.parquet"))
            .is_file()
    );
    assert!(out.join(SUCCESS_MARKER).is_file());
}

#[test]
fn test_write_overwrites_previous_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dataset");
    let config = PipelineConfig::default().with_progress(false);

    std::fs::create_dir_all(out.join("postal_code=STALE")).unwrap();
    write_partitioned(&sample_batch(), &out, PARTITION_COLUMN, &config).unwrap();

    assert!(!out.join("postal_code=STALE").exists());
}

#[test]
fn test_round_trip_restores_partition_column() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dataset");
    let config = PipelineConfig::default().with_progress(false);

    write_partitioned(&sample_batch(), &out, PARTITION_COLUMN, &config).unwrap();
    let dataset = read_partitioned(&out, PARTITION_COLUMN).unwrap();
    assert_eq!(dataset.num_rows(), 4);

    let ids = dataset.column_by_name("id").unwrap().as_primitive::<Int64Type>();
    let codes = dataset.column_by_name(PARTITION_COLUMN).unwrap().as_string::<i32>();

    let mut rows: Vec<(i64, Option<String>)> = (0..dataset.num_rows())
        .map(|i| (ids.value(i), codes.is_valid(i).then(|| codes.value(i).to_string())))
        .collect();
    rows.sort();

    assert_eq!(
        rows,
        vec![
            (1, Some("1012LG".to_string())),
            (2, Some("3511BD".to_string())),
            (3, None),
            (4, Some("1012LG".to_string())),
        ]
    );
}

#[test]
fn test_missing_partition_column() {
    let dir = tempfile::tempdir().unwrap();
    let ids: ArrayRef = Arc::new(Int64Array::from(vec![1]));
    let batch = RecordBatch::try_from_iter(vec![("id", ids)]).unwrap();
    let config = PipelineConfig::default().with_progress(false);

    assert!(write_partitioned(&batch, dir.path(), PARTITION_COLUMN, &config).is_err());
}
