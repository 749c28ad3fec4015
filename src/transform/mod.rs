//! Derived columns and anonymization
//!
//! Each step takes a record batch and returns a new one with a column added
//! or replaced. [`apply_all`] chains them in pipeline order:
//! coordinates, postal code, province, anonymization.

pub mod anonymize;
pub mod geo;
pub mod postal;
pub mod province;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::Result;

pub use anonymize::{ANONYMIZED_ADDRESS_FIELDS, ANONYMIZED_COLUMNS, anonymize};
pub use geo::{LAT_COLUMN, LON_COLUMN, extract_coordinates};
pub use postal::{normalize_postal_code, with_postal_code};
pub use province::{PROVINCE_COLUMN, UNKNOWN_PROVINCE, province_for_postal_code, with_province};

/// Apply every transformation to one batch
pub fn apply_all(batch: &RecordBatch, config: &PipelineConfig) -> Result<RecordBatch> {
    let batch = extract_coordinates(batch)?;
    let batch = with_postal_code(&batch)?;
    let batch = with_province(&batch)?;
    anonymize(&batch, &config.anonymization_marker)
}

/// Transform multiple record batches in parallel using `transformation`
///
/// Empty results are dropped.
pub fn transform_records(
    batches: &[RecordBatch],
    transformation: &(dyn Fn(&RecordBatch) -> Result<RecordBatch> + Send + Sync),
) -> Result<Vec<RecordBatch>> {
    let results: Vec<Result<RecordBatch>> = batches.par_iter().map(transformation).collect();

    let mut transformed = Vec::with_capacity(batches.len());
    for result in results {
        let batch = result?;
        if batch.num_rows() > 0 {
            transformed.push(batch);
        }
    }
    Ok(transformed)
}

/// Split `batch` into slices of `chunk_size` rows, transform them in
/// parallel and stitch the result back together
pub fn transform_chunked(batch: &RecordBatch, config: &PipelineConfig) -> Result<RecordBatch> {
    let chunk_size = config.batch_size.max(1);
    let chunks: Vec<RecordBatch> = (0..batch.num_rows())
        .step_by(chunk_size)
        .map(|offset| batch.slice(offset, chunk_size.min(batch.num_rows() - offset)))
        .collect();

    if chunks.is_empty() {
        return apply_all(batch, config);
    }

    let transformed = transform_records(&chunks, &|chunk| apply_all(chunk, config))?;
    let schema = transformed[0].schema();
    Ok(concat_batches(&schema, &transformed)?)
}
