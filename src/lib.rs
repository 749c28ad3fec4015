//! Retail location ETL.
//!
//! Loads per-brand JSON location datasets, unions them by column name,
//! derives coordinates, postal code and province, anonymizes street-level
//! address fields and writes a Parquet dataset partitioned by postal code.

pub mod brand;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod utils;

pub use brand::{ALLOWED_BRANDS, BRAND_COLUMN, validate_brand};
pub use config::{PARTITION_COLUMN, PipelineConfig};
pub use error::{PipelineError, Result};
pub use io::{WriteSummary, read_json_records, read_partitioned, write_partitioned};
pub use pipeline::{BrandFrames, PipelineReport, load_all, load_brand, run, union_frames};
pub use schema::union_by_name;
pub use transform::{apply_all, province_for_postal_code};

pub use arrow::record_batch::RecordBatch;
