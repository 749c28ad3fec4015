//! Partitioned Parquet datasets
//!
//! The output dataset uses the Hive directory layout: one
//! `<column>=<value>` directory per distinct partition value, each holding a
//! Parquet file with the remaining columns. Writing always overwrites the
//! whole dataset.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{AsArray, UInt32Array, new_null_array};
use arrow::compute::kernels::cast::cast;
use arrow::compute::take_record_batch;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::schema::union_by_name;
use crate::utils::arrow::{
    constant_string_array, contains_empty_struct, drop_column, prune_empty_structs, upsert_column,
};
use crate::utils::logging::{
    create_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_warning,
};

/// Directory value used for null or empty partition keys
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// Marker file written after a successful dataset write
pub const SUCCESS_MARKER: &str = "_SUCCESS";

const PART_FILE_NAME: &str = "part-00000.parquet";

/// Outcome of writing a partitioned dataset
#[derive(Debug, Clone, Serialize)]
pub struct WriteSummary {
    /// Dataset root
    pub output_dir: PathBuf,
    /// Column the dataset is partitioned by
    pub partition_column: String,
    /// Number of partition directories written
    pub partitions: usize,
    /// Total rows written
    pub rows: usize,
    /// Data files, sorted
    pub files: Vec<PathBuf>,
}

/// Directory name of the partition holding `value`
///
/// Characters outside `[A-Za-z0-9._-]` are percent-escaped.
#[must_use]
pub fn partition_dir_name(column: &str, value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.is_empty() => escape_partition_value(v),
        _ => DEFAULT_PARTITION_NAME.to_string(),
    };
    format!("{column}={value}")
}

fn escape_partition_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

fn unescape_partition_value(escaped: &str) -> String {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let decoded = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match decoded {
            Some(b) => {
                out.push(b);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a `<column>=<value>` directory name back into the partition value
fn parse_partition_dir(dir_name: &str, column: &str) -> Option<Option<String>> {
    let value = dir_name.strip_prefix(column)?.strip_prefix('=')?;
    if value == DEFAULT_PARTITION_NAME {
        Some(None)
    } else {
        Some(Some(unescape_partition_value(value)))
    }
}

/// Strip nested objects without fields, which Parquet cannot store
///
/// Returns the writable batch and the names of the columns that were pruned
/// or removed entirely.
pub fn prune_unwritable_columns(batch: &RecordBatch) -> Result<(RecordBatch, Vec<String>)> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(schema.fields().len());
    let mut pruned = Vec::new();

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if !contains_empty_struct(field.data_type()) {
            fields.push(field.as_ref().clone());
            columns.push(column.clone());
            continue;
        }

        pruned.push(field.name().clone());
        if let Some(column) = prune_empty_structs(column)? {
            fields.push(Field::new(field.name(), column.data_type().clone(), true));
            columns.push(column);
        }
    }

    if pruned.is_empty() {
        return Ok((batch.clone(), pruned));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    let batch = RecordBatch::try_new_with_options(Arc::new(schema), columns, &options)?;
    Ok((batch, pruned))
}

/// Write a single record batch to a Parquet file
pub fn write_parquet_file(path: &Path, batch: &RecordBatch, props: WriterProperties) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Write `batch` as a dataset partitioned by `partition_column`
///
/// Any existing dataset at `output_dir` is removed first. The partition
/// column itself is not stored in the data files; it is encoded in the
/// directory names. Nested objects without fields are stripped before
/// writing.
pub fn write_partitioned(
    batch: &RecordBatch,
    output_dir: &Path,
    partition_column: &str,
    config: &PipelineConfig,
) -> Result<WriteSummary> {
    let start = Instant::now();
    log_operation_start("Writing partitioned dataset to", output_dir);

    let keys = batch.column_by_name(partition_column).ok_or_else(|| {
        PipelineError::schema(format!(
            "Partition column '{partition_column}' not found"
        ))
    })?;
    let keys = cast(keys, &DataType::Utf8)?;

    let mut groups: FxHashMap<String, Vec<u32>> = FxHashMap::default();
    for (row, key) in keys.as_string::<i32>().iter().enumerate() {
        let row = u32::try_from(row)
            .map_err(|_| PipelineError::schema("Too many rows for a single partition write"))?;
        groups
            .entry(partition_dir_name(partition_column, key))
            .or_default()
            .push(row);
    }

    let (data, pruned) = prune_unwritable_columns(&drop_column(batch, partition_column)?)?;
    if !pruned.is_empty() {
        log_warning(
            &format!("Removing empty nested objects from columns: {}", pruned.join(", ")),
            None,
        );
    }

    if output_dir.exists() {
        log_warning("Overwriting existing dataset", Some(output_dir));
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    let props = WriterProperties::builder()
        .set_compression(config.compression)
        .set_max_row_group_size(config.max_rows_per_group)
        .build();

    let pb = create_progress_bar(
        groups.len() as u64,
        Some("Writing partitions"),
        config.show_progress,
    );

    let written = groups
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect_vec()
        .into_par_iter()
        .map(|(dir_name, rows)| -> Result<(PathBuf, usize)> {
            let indices = UInt32Array::from(rows);
            let part = take_record_batch(&data, &indices)?;

            let dir = output_dir.join(&dir_name);
            fs::create_dir_all(&dir)?;
            let path = dir.join(PART_FILE_NAME);
            write_parquet_file(&path, &part, props.clone())?;

            pb.inc(1);
            Ok((path, part.num_rows()))
        })
        .collect::<Result<Vec<_>>>()?;

    finish_progress_bar(&pb, Some("Partitions written"));

    let summary = WriteSummary {
        output_dir: output_dir.to_path_buf(),
        partition_column: partition_column.to_string(),
        partitions: written.len(),
        rows: written.iter().map(|(_, rows)| rows).sum(),
        files: written.into_iter().map(|(path, _)| path).collect(),
    };

    fs::write(
        output_dir.join(SUCCESS_MARKER),
        serde_json::to_vec_pretty(&summary)?,
    )?;

    log_operation_complete("wrote", output_dir, summary.rows, Some(start.elapsed()));
    Ok(summary)
}

/// Read a single Parquet file into record batches
pub fn read_parquet_file(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Read a partitioned dataset back into one record batch
///
/// The partition column is re-attached from the directory names as a Utf8
/// column, null for the default partition.
pub fn read_partitioned(dataset_dir: &Path, partition_column: &str) -> Result<RecordBatch> {
    if !dataset_dir.is_dir() {
        return Err(PipelineError::FileNotFound {
            path: dataset_dir.to_path_buf(),
        });
    }

    let start = Instant::now();
    log_operation_start("Reading partitioned dataset from", dataset_dir);

    let mut partitions = Vec::new();
    for entry in fs::read_dir(dataset_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(value) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| parse_partition_dir(n, partition_column))
        else {
            log_warning("Skipping non-partition directory", Some(&path));
            continue;
        };
        partitions.push((path, value));
    }
    partitions.sort_by(|a, b| a.0.cmp(&b.0));

    let batches = partitions
        .par_iter()
        .map(|(dir, value)| read_partition(dir, partition_column, value.as_deref()))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect_vec();

    let dataset = if batches.is_empty() {
        RecordBatch::new_empty(Arc::new(Schema::empty()))
    } else {
        union_by_name(&batches)?
    };

    log_operation_complete("read", dataset_dir, dataset.num_rows(), Some(start.elapsed()));
    Ok(dataset)
}

fn read_partition(
    dir: &Path,
    partition_column: &str,
    value: Option<&str>,
) -> Result<Vec<RecordBatch>> {
    let files = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "parquet"))
        .sorted()
        .collect_vec();

    let mut batches = Vec::new();
    for file in files {
        for batch in read_parquet_file(&file)? {
            let keys = match value {
                Some(v) => constant_string_array(v, batch.num_rows()),
                None => new_null_array(&DataType::Utf8, batch.num_rows()),
            };
            batches.push(upsert_column(&batch, partition_column, keys)?);
        }
    }
    Ok(batches)
}
