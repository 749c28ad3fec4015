//! Data type compatibility and unification.

use std::sync::Arc;

use arrow::compute::kernels::cast::can_cast_types;
use arrow::datatypes::{DataType, Field, Fields};
use rustc_hash::FxHashMap;

use crate::error::{PipelineError, Result};

/// How a source type relates to a target type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCompatibility {
    /// Types match exactly
    Exact,
    /// Source can be converted to the target
    Compatible,
    /// No conversion exists
    Incompatible,
}

/// Identifies whether a data type is numeric
#[must_use]
pub const fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

const fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

const fn is_nested(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Struct(_) | DataType::List(_) | DataType::LargeList(_)
    )
}

/// Check whether `from` can be conformed to `to`
#[must_use]
pub fn check_type_compatibility(from: &DataType, to: &DataType) -> TypeCompatibility {
    if from == to {
        return TypeCompatibility::Exact;
    }

    match (from, to) {
        (DataType::Null, _) => TypeCompatibility::Compatible,
        (DataType::Struct(from_fields), DataType::Struct(to_fields)) => {
            let all_children_fit = from_fields.iter().all(|f| {
                to_fields.find(f.name()).is_some_and(|(_, t)| {
                    check_type_compatibility(f.data_type(), t.data_type())
                        != TypeCompatibility::Incompatible
                })
            });
            if all_children_fit {
                TypeCompatibility::Compatible
            } else {
                TypeCompatibility::Incompatible
            }
        }
        (DataType::List(from_item), DataType::List(to_item)) => {
            match check_type_compatibility(from_item.data_type(), to_item.data_type()) {
                TypeCompatibility::Incompatible => TypeCompatibility::Incompatible,
                _ => TypeCompatibility::Compatible,
            }
        }
        (f, t) if is_nested(f) || is_nested(t) => TypeCompatibility::Incompatible,
        (f, t) if can_cast_types(f, t) => TypeCompatibility::Compatible,
        _ => TypeCompatibility::Incompatible,
    }
}

/// Find a type both `a` and `b` can be conformed to
///
/// Integers widen to the larger integer, integers meet floats at `Float64`,
/// structs merge their children by name, lists unify their items and any
/// other scalar conflict falls back to `Utf8`. Nested types never unify with
/// scalars.
pub fn unify_types(a: &DataType, b: &DataType) -> Result<DataType> {
    if a == b {
        return Ok(a.clone());
    }

    match (a, b) {
        (DataType::Null, other) | (other, DataType::Null) => Ok(other.clone()),
        (DataType::Struct(left), DataType::Struct(right)) => {
            Ok(DataType::Struct(merge_struct_fields(left, right)?))
        }
        (DataType::List(left), DataType::List(right)) => {
            let item = unify_types(left.data_type(), right.data_type())?;
            Ok(DataType::List(Arc::new(Field::new(left.name(), item, true))))
        }
        (l, r) if is_nested(l) || is_nested(r) => Err(PipelineError::schema(format!(
            "Cannot unify nested type {l:?} with {r:?}"
        ))),
        (l, r) if is_integer(l) && is_integer(r) => Ok(wider_integer(l, r)),
        (l, r) if is_numeric(l) && is_numeric(r) => Ok(DataType::Float64),
        (DataType::Utf8, DataType::LargeUtf8) | (DataType::LargeUtf8, DataType::Utf8) => {
            Ok(DataType::LargeUtf8)
        }
        (l, r) if can_cast_types(l, &DataType::Utf8) && can_cast_types(r, &DataType::Utf8) => {
            Ok(DataType::Utf8)
        }
        (l, r) => Err(PipelineError::schema(format!(
            "Cannot unify {l:?} with {r:?}"
        ))),
    }
}

/// Merge two struct field lists by name, left order first
fn merge_struct_fields(left: &Fields, right: &Fields) -> Result<Fields> {
    let mut merged: Vec<(String, DataType)> = Vec::with_capacity(left.len() + right.len());
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for field in left.iter().chain(right.iter()) {
        if let Some(&idx) = index.get(field.name()) {
            let unified = unify_types(&merged[idx].1, field.data_type())
                .map_err(|e| PipelineError::schema(format!("field '{}': {e}", field.name())))?;
            merged[idx].1 = unified;
        } else {
            index.insert(field.name().clone(), merged.len());
            merged.push((field.name().clone(), field.data_type().clone()));
        }
    }

    Ok(merged
        .into_iter()
        .map(|(name, data_type)| Field::new(name, data_type, true))
        .collect())
}

/// Rank signed and unsigned integers; unsigned 64-bit widens to signed 64-bit
fn wider_integer(a: &DataType, b: &DataType) -> DataType {
    let signed = |dt: &DataType| {
        matches!(
            dt,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    };
    let width = |dt: &DataType| dt.primitive_width().unwrap_or(8);

    if signed(a) == signed(b) {
        return if width(a) >= width(b) { a.clone() } else { b.clone() };
    }

    // Mixed signedness needs one extra byte of headroom
    match width(a).max(width(b)) {
        1 => DataType::Int16,
        2 => DataType::Int32,
        _ => DataType::Int64,
    }
}
