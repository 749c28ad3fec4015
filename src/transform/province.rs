//! Province lookup from Dutch four-digit postal code ranges.

use std::sync::Arc;

use arrow::array::{AsArray, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::config::PARTITION_COLUMN;
use crate::error::Result;
use crate::utils::arrow::{get_column, upsert_column};

/// Derived province column
pub const PROVINCE_COLUMN: &str = "province";

/// Value used when no province matches
pub const UNKNOWN_PROVINCE: &str = "Unknown";

/// Inclusive postal code ranges and their province, sorted by range start
pub const PROVINCE_TABLE: &[(u16, u16, &str)] = &[
    (1000, 1299, "Noord-Holland"),
    (1300, 1379, "Flevoland"),
    (1380, 2199, "Noord-Holland"),
    (2200, 3399, "Zuid-Holland"),
    (3400, 3999, "Utrecht"),
    (4000, 4199, "Gelderland"),
    (4200, 4299, "Zuid-Holland"),
    (4300, 4599, "Zeeland"),
    (4600, 5299, "Noord-Brabant"),
    (5300, 5335, "Gelderland"),
    (5336, 5799, "Noord-Brabant"),
    (5800, 6499, "Limburg"),
    (6500, 7399, "Gelderland"),
    (7400, 7799, "Overijssel"),
    (7800, 7999, "Drenthe"),
    (8000, 8199, "Overijssel"),
    (8200, 8259, "Flevoland"),
    (8260, 8299, "Overijssel"),
    (8300, 8399, "Flevoland"),
    (8400, 9299, "Friesland"),
    (9300, 9499, "Drenthe"),
    (9500, 9999, "Groningen"),
];

/// Look up the province of a postal code
///
/// Only the leading four digits are used. Null, non-numeric or out of
/// range codes map to [`UNKNOWN_PROVINCE`].
#[must_use]
pub fn province_for_postal_code(postal_code: Option<&str>) -> &'static str {
    postal_code
        .and_then(|code| code.trim().get(..4))
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u16>().ok())
        .and_then(lookup)
        .unwrap_or(UNKNOWN_PROVINCE)
}

fn lookup(number: u16) -> Option<&'static str> {
    let idx = PROVINCE_TABLE.partition_point(|&(_, end, _)| end < number);
    PROVINCE_TABLE
        .get(idx)
        .filter(|&&(start, end, _)| (start..=end).contains(&number))
        .map(|&(_, _, province)| province)
}

/// Add the `province` column derived from `postal_code`
pub fn with_province(batch: &RecordBatch) -> Result<RecordBatch> {
    let provinces: StringArray = match get_column(batch, PARTITION_COLUMN, &DataType::Utf8)? {
        Some(codes) => codes
            .as_string::<i32>()
            .iter()
            .map(|code| Some(province_for_postal_code(code)))
            .collect(),
        None => std::iter::repeat_n(Some(UNKNOWN_PROVINCE), batch.num_rows()).collect(),
    };

    upsert_column(batch, PROVINCE_COLUMN, Arc::new(provinces))
}
