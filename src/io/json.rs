//! JSON record loading
//!
//! Input files hold location records either as a JSON array of objects, a
//! single object, or newline-delimited JSON. The Arrow schema is inferred from
//! every record so that fields present in only a few records still get a column.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::json::ReaderBuilder;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::record_batch::RecordBatch;
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read a JSON file of location records into a single record batch
pub fn read_json_records(path: &Path, batch_size: usize) -> Result<RecordBatch> {
    if !path.is_file() {
        return Err(PipelineError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let start = std::time::Instant::now();
    log_operation_start("Reading JSON records from", path);

    let content = fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    let batch = records_to_batch(&records, batch_size)?;

    log_operation_complete("read", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Split file content into individual JSON objects
fn parse_records(content: &str) -> Result<Vec<Value>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values.into_iter().map(expect_object).collect();
    }

    // A single object or newline-delimited objects
    serde_json::Deserializer::from_str(trimmed)
        .into_iter::<Value>()
        .map(|value| expect_object(value?))
        .collect()
}

fn expect_object(value: Value) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(PipelineError::schema(format!(
            "Expected a JSON object per record, found: {value}"
        )))
    }
}

/// Decode JSON objects into one record batch with an inferred schema
///
/// An empty slice yields a zero-row batch with an empty schema.
pub fn records_to_batch(records: &[Value], batch_size: usize) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let schema = Arc::new(infer_json_schema_from_iterator(records.iter().map(Ok))?);
    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(batch_size)
        .build_decoder()?;

    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size.max(1)));
    for chunk in records.chunks(batch_size.max(1)) {
        decoder.serialize(chunk)?;
        if let Some(batch) = decoder.flush()? {
            batches.push(batch);
        }
    }

    Ok(concat_batches(&schema, &batches)?)
}
