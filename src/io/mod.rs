//! File input and output: JSON record loading and partitioned Parquet datasets.

pub mod json;
pub mod parquet;

pub use self::json::{read_json_records, records_to_batch};
pub use self::parquet::{
    DEFAULT_PARTITION_NAME, WriteSummary, partition_dir_name, read_partitioned, write_partitioned,
};
