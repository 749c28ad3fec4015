//! Geo-coordinate extraction.
//!
//! Flattens the nested `geoCoordinates` object into top-level `lat` and `lon`
//! Float64 columns.

use arrow::array::{ArrayRef, AsArray, new_null_array};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::error::Result;
use crate::utils::arrow::{struct_child, upsert_column};

/// Nested column holding the coordinates
pub const GEO_COLUMN: &str = "geoCoordinates";
/// Derived latitude column
pub const LAT_COLUMN: &str = "lat";
/// Derived longitude column
pub const LON_COLUMN: &str = "lon";

const LATITUDE_KEYS: &[&str] = &["latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lon", "lng"];

/// Add `lat` and `lon` columns taken from `geoCoordinates`
///
/// Numeric strings are parsed; anything unparsable or outside the valid
/// degree range becomes null. Without a `geoCoordinates` column both
/// columns are all-null.
pub fn extract_coordinates(batch: &RecordBatch) -> Result<RecordBatch> {
    let num_rows = batch.num_rows();
    let (lat, lon) = match batch.column_by_name(GEO_COLUMN) {
        Some(geo) => (
            coordinate(geo, LATITUDE_KEYS, 90.0)?,
            coordinate(geo, LONGITUDE_KEYS, 180.0)?,
        ),
        None => (
            new_null_array(&DataType::Float64, num_rows),
            new_null_array(&DataType::Float64, num_rows),
        ),
    };

    let batch = upsert_column(batch, LAT_COLUMN, lat)?;
    upsert_column(&batch, LON_COLUMN, lon)
}

fn coordinate(geo: &ArrayRef, keys: &[&str], limit: f64) -> Result<ArrayRef> {
    for key in keys {
        if let Some(child) = struct_child(geo, key)? {
            let degrees = cast(&child, &DataType::Float64)?;
            let in_range = degrees
                .as_primitive::<Float64Type>()
                .unary_opt::<_, Float64Type>(|v| (v.is_finite() && v.abs() <= limit).then_some(v));
            return Ok(Arc::new(in_range));
        }
    }
    Ok(new_null_array(&DataType::Float64, geo.len()))
}
