//! Conform record batches to a superset schema and union them by column name.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, ListArray, StructArray, new_null_array};
use arrow::compute::concat_batches;
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use rustc_hash::FxHashMap;

use crate::error::{PipelineError, Result};
use crate::schema::compatibility::{TypeCompatibility, check_type_compatibility, unify_types};

/// A column whose type changes when conforming to the target schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAdaptation {
    /// Column name
    pub column: String,
    /// Type in the source batch
    pub source_type: DataType,
    /// Type in the target schema
    pub target_type: DataType,
}

/// What conforming a batch to a target schema will do
#[derive(Debug, Default)]
pub struct SchemaConformReport {
    /// Target columns absent from the source, filled with nulls
    pub missing: Vec<String>,
    /// Columns that need a type conversion
    pub adaptations: Vec<ColumnAdaptation>,
    /// Columns that cannot be converted
    pub incompatible: Vec<ColumnAdaptation>,
}

/// Compare a source schema against the target it will be conformed to
#[must_use]
pub fn check_conformance(source: &Schema, target: &Schema) -> SchemaConformReport {
    let mut report = SchemaConformReport::default();

    for target_field in target.fields() {
        let Ok(source_field) = source.field_with_name(target_field.name()) else {
            report.missing.push(target_field.name().clone());
            continue;
        };

        let adaptation = ColumnAdaptation {
            column: target_field.name().clone(),
            source_type: source_field.data_type().clone(),
            target_type: target_field.data_type().clone(),
        };
        match check_type_compatibility(source_field.data_type(), target_field.data_type()) {
            TypeCompatibility::Exact => {}
            TypeCompatibility::Compatible => report.adaptations.push(adaptation),
            TypeCompatibility::Incompatible => report.incompatible.push(adaptation),
        }
    }

    report
}

/// Build the schema holding every column of every input schema
///
/// Columns keep the order of the first schema they appear in; all fields are
/// nullable since any of them may be filled with nulls.
pub fn superset_schema(schemas: &[SchemaRef]) -> Result<Schema> {
    let mut columns: Vec<(String, DataType)> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for field in schemas.iter().flat_map(|s| s.fields().iter()) {
        if let Some(&idx) = index.get(field.name()) {
            columns[idx].1 = unify_types(&columns[idx].1, field.data_type()).map_err(|e| {
                PipelineError::schema(format!("column '{}': {e}", field.name()))
            })?;
        } else {
            index.insert(field.name().clone(), columns.len());
            columns.push((field.name().clone(), field.data_type().clone()));
        }
    }

    Ok(Schema::new(
        columns
            .into_iter()
            .map(|(name, data_type)| Field::new(name, data_type, true))
            .collect::<Vec<_>>(),
    ))
}

/// Convert an array to `target_type`
///
/// Structs are rebuilt child by child, matching children by name and adding
/// null children where the source has none. Lists conform their items. All
/// other conversions go through Arrow's cast kernel.
pub fn conform_array(array: &ArrayRef, target_type: &DataType) -> Result<ArrayRef> {
    if array.data_type() == target_type {
        return Ok(array.clone());
    }
    if array.data_type() == &DataType::Null {
        return Ok(new_null_array(target_type, array.len()));
    }

    match target_type {
        DataType::Struct(target_fields) => {
            let source = array.as_struct_opt().ok_or_else(|| {
                PipelineError::schema(format!(
                    "Cannot conform {:?} to a struct",
                    array.data_type()
                ))
            })?;

            let children = target_fields
                .iter()
                .map(|field| match source.column_by_name(field.name()) {
                    Some(child) => conform_array(child, field.data_type()),
                    None => Ok(new_null_array(field.data_type(), source.len())),
                })
                .collect::<Result<Vec<_>>>()?;

            let rebuilt = StructArray::try_new_with_length(
                target_fields.clone(),
                children,
                source.nulls().cloned(),
                source.len(),
            )?;
            Ok(Arc::new(rebuilt))
        }
        DataType::List(target_item) => {
            let source = array.as_list_opt::<i32>().ok_or_else(|| {
                PipelineError::schema(format!(
                    "Cannot conform {:?} to a list",
                    array.data_type()
                ))
            })?;

            let values = conform_array(source.values(), target_item.data_type())?;
            let rebuilt = ListArray::try_new(
                target_item.clone(),
                source.offsets().clone(),
                values,
                source.nulls().cloned(),
            )?;
            Ok(Arc::new(rebuilt))
        }
        _ => Ok(cast(array, target_type)?),
    }
}

/// Conform a record batch to the target schema
///
/// Missing columns become all-null columns; extra source columns are dropped.
pub fn conform_batch(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let columns = target
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(column) => conform_array(column, field.data_type()).map_err(|e| {
                PipelineError::schema(format!("column '{}': {e}", field.name()))
            }),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<_>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(
        target.clone(),
        columns,
        &options,
    )?)
}

/// Union record batches by column name
///
/// The result has the superset schema of all inputs, with nulls where a
/// batch lacked a column.
pub fn union_by_name(batches: &[RecordBatch]) -> Result<RecordBatch> {
    if batches.is_empty() {
        return Err(PipelineError::NoData(
            "no datasets to union".to_string(),
        ));
    }

    let schemas: Vec<SchemaRef> = batches.iter().map(RecordBatch::schema).collect();
    let target = Arc::new(superset_schema(&schemas)?);

    let conformed = batches
        .iter()
        .map(|batch| conform_batch(batch, &target))
        .collect::<Result<Vec<_>>>()?;

    Ok(concat_batches(&target, &conformed)?)
}
