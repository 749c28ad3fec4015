//! Utilities for working with Arrow arrays.
//!
//! Column lookup with type adaptation, nested struct access, and
//! replace-or-append of derived columns.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, ListArray, StringArray, StructArray, make_array};
use arrow::buffer::NullBuffer;
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::Result;

/// Get a column from a record batch, cast to `expected_type` if needed
///
/// Returns `Ok(None)` when the column does not exist. Values that cannot be
/// converted become null.
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
) -> Result<Option<ArrayRef>> {
    let Some(column) = batch.column_by_name(column_name) else {
        return Ok(None);
    };

    if column.data_type() == expected_type {
        return Ok(Some(column.clone()));
    }

    debug!(
        "Converting column '{column_name}' from {:?} to {expected_type:?}",
        column.data_type()
    );
    Ok(Some(cast(column, expected_type)?))
}

/// Get a named child of a struct array, with the parent's nulls applied
///
/// Returns `Ok(None)` if `array` is not a struct or has no such child.
pub fn struct_child(array: &ArrayRef, child_name: &str) -> Result<Option<ArrayRef>> {
    let Some(parent) = array.as_struct_opt() else {
        return Ok(None);
    };
    let Some(child) = parent.column_by_name(child_name) else {
        return Ok(None);
    };
    mask_with_parent_nulls(child, parent.nulls()).map(Some)
}

/// Null out every slot of `child` whose parent slot is null
pub fn mask_with_parent_nulls(child: &ArrayRef, parent_nulls: Option<&NullBuffer>) -> Result<ArrayRef> {
    if parent_nulls.is_none() || child.data_type() == &DataType::Null {
        return Ok(child.clone());
    }

    let combined = NullBuffer::union(parent_nulls, child.logical_nulls().as_ref());
    let data = child.to_data().into_builder().nulls(combined).build()?;
    Ok(make_array(data))
}

/// Replace the column called `column_name`, or append it when absent
///
/// The field is always declared nullable.
pub fn upsert_column(
    batch: &RecordBatch,
    column_name: &str,
    array: ArrayRef,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let field = Arc::new(Field::new(column_name, array.data_type().clone(), true));

    let mut fields = schema.fields().to_vec();
    let mut columns = batch.columns().to_vec();

    if let Ok(idx) = schema.index_of(column_name) {
        fields[idx] = field;
        columns[idx] = array;
    } else {
        fields.push(field);
        columns.push(array);
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Remove a column by name; a missing column is not an error
pub fn drop_column(batch: &RecordBatch, column_name: &str) -> Result<RecordBatch> {
    let schema = batch.schema();
    let keep: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name() != column_name)
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&keep)?)
}

/// A Utf8 array holding `value` in every slot
#[must_use]
pub fn constant_string_array(value: &str, len: usize) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(std::iter::repeat_n(value, len)))
}

/// Whether `data_type` holds a struct without fields at any depth
#[must_use]
pub fn contains_empty_struct(data_type: &DataType) -> bool {
    match data_type {
        DataType::Struct(fields) => {
            fields.is_empty() || fields.iter().any(|f| contains_empty_struct(f.data_type()))
        }
        DataType::List(item) => contains_empty_struct(item.data_type()),
        _ => false,
    }
}

/// Remove fieldless structs from a nested array
///
/// Struct children are dropped when they reduce to nothing. Returns
/// `Ok(None)` when the whole array reduces to nothing: a struct left without
/// children, or a list whose items are such a struct.
pub fn prune_empty_structs(array: &ArrayRef) -> Result<Option<ArrayRef>> {
    if !contains_empty_struct(array.data_type()) {
        return Ok(Some(array.clone()));
    }

    match array.data_type() {
        DataType::Struct(fields) => {
            let parent = array.as_struct();
            let mut kept_fields = Vec::with_capacity(fields.len());
            let mut kept_columns = Vec::with_capacity(fields.len());
            for (field, column) in fields.iter().zip(parent.columns()) {
                if let Some(column) = prune_empty_structs(column)? {
                    let field = field.as_ref().clone();
                    kept_fields.push(field.with_data_type(column.data_type().clone()));
                    kept_columns.push(column);
                }
            }
            if kept_fields.is_empty() {
                return Ok(None);
            }

            let rebuilt = StructArray::try_new_with_length(
                kept_fields.into(),
                kept_columns,
                parent.nulls().cloned(),
                parent.len(),
            )?;
            Ok(Some(Arc::new(rebuilt)))
        }
        DataType::List(item) => {
            let list = array.as_list::<i32>();
            let Some(values) = prune_empty_structs(list.values())? else {
                return Ok(None);
            };
            let item = item.as_ref().clone().with_data_type(values.data_type().clone());
            let rebuilt = ListArray::try_new(
                Arc::new(item),
                list.offsets().clone(),
                values,
                list.nulls().cloned(),
            )?;
            Ok(Some(Arc::new(rebuilt)))
        }
        _ => Ok(Some(array.clone())),
    }
}
