//! Anonymization of street-level address fields.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StructArray};
use arrow::datatypes::{DataType, Field, Fields};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::transform::postal::ADDRESS_COLUMN;
use crate::utils::arrow::{constant_string_array, upsert_column};

/// Top-level columns overwritten with the marker (added if absent)
pub const ANONYMIZED_COLUMNS: &[&str] = &["houseNumber", "streetName"];

/// Children of the `address` object overwritten with the marker
pub const ANONYMIZED_ADDRESS_FIELDS: &[&str] = &["houseNumber", "streetName", "street"];

/// Replace house number and street name with `marker`
///
/// Every row gets the marker, including rows where the original value was
/// null, so the output never reveals whether a field was present.
pub fn anonymize(batch: &RecordBatch, marker: &str) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let mut out = batch.clone();

    if let Some(address) = batch
        .column_by_name(ADDRESS_COLUMN)
        .and_then(|column| column.as_struct_opt())
    {
        let rebuilt = anonymize_struct(address, marker)?;
        out = upsert_column(&out, ADDRESS_COLUMN, rebuilt)?;
    }

    for column in ANONYMIZED_COLUMNS {
        out = upsert_column(&out, column, constant_string_array(marker, num_rows))?;
    }

    Ok(out)
}

fn anonymize_struct(address: &StructArray, marker: &str) -> Result<ArrayRef> {
    let (fields, columns): (Vec<Field>, Vec<ArrayRef>) = address
        .fields()
        .iter()
        .zip(address.columns())
        .map(|(field, column)| {
            if ANONYMIZED_ADDRESS_FIELDS.contains(&field.name().as_str()) {
                (
                    Field::new(field.name(), DataType::Utf8, true),
                    constant_string_array(marker, address.len()),
                )
            } else {
                (field.as_ref().clone(), column.clone())
            }
        })
        .unzip();

    let rebuilt = StructArray::try_new_with_length(
        Fields::from(fields),
        columns,
        address.nulls().cloned(),
        address.len(),
    )?;
    Ok(Arc::new(rebuilt))
}
