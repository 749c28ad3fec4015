//! Postal code normalization.

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, StringArray, new_null_array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::config::PARTITION_COLUMN;
use crate::error::Result;
use crate::utils::arrow::{get_column, struct_child, upsert_column};

/// Nested column holding the postal address
pub const ADDRESS_COLUMN: &str = "address";

const POSTAL_CODE_KEYS: &[&str] = &["postalCode", "postal_code", "zipCode"];

/// Normalize a raw postal code: whitespace removed, upper-cased
///
/// `" 1011 ab "` becomes `"1011AB"`. Blank input yields `None`.
#[must_use]
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    (!compact.is_empty()).then_some(compact)
}

/// Add the normalized `postal_code` column
///
/// The raw value is taken from `address.postalCode` when present, falling
/// back to a top-level postal code column.
pub fn with_postal_code(batch: &RecordBatch) -> Result<RecordBatch> {
    let raw = raw_postal_codes(batch)?;
    let normalized: StringArray = raw
        .as_string::<i32>()
        .iter()
        .map(|value| value.and_then(normalize_postal_code))
        .collect();

    upsert_column(batch, PARTITION_COLUMN, Arc::new(normalized))
}

fn raw_postal_codes(batch: &RecordBatch) -> Result<ArrayRef> {
    if let Some(address) = batch.column_by_name(ADDRESS_COLUMN) {
        for key in POSTAL_CODE_KEYS {
            if let Some(child) = struct_child(address, key)? {
                return Ok(arrow::compute::kernels::cast::cast(&child, &DataType::Utf8)?);
            }
        }
    }

    for key in POSTAL_CODE_KEYS {
        if let Some(column) = get_column(batch, key, &DataType::Utf8)? {
            return Ok(column);
        }
    }

    log::warn!("No postal code found in batch; '{PARTITION_COLUMN}' will be null");
    Ok(new_null_array(&DataType::Utf8, batch.num_rows()))
}
