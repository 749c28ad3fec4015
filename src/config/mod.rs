//! Configuration for the places pipeline.

use std::path::{Path, PathBuf};

use parquet::basic::Compression;

use crate::brand::ALLOWED_BRANDS;

/// Default number of JSON records decoded per Arrow batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Default maximum number of rows per Parquet row group
pub const DEFAULT_MAX_ROWS_PER_GROUP: usize = 1024 * 1024;

/// Marker written over anonymized address fields
pub const DEFAULT_ANONYMIZATION_MARKER: &str = "***";

/// Column the output dataset is partitioned by
pub const PARTITION_COLUMN: &str = "postal_code";

/// Engine knob for the decode batch size
pub const BATCH_SIZE_ENV: &str = "PLACES_BATCH_SIZE";

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var(BATCH_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the `{brand}-places.json` inputs
    pub input_dir: PathBuf,
    /// Directory the partitioned dataset is written to (overwritten)
    pub output_dir: PathBuf,
    /// Brands to load, in order
    pub brands: Vec<String>,
    /// Number of JSON records decoded per batch
    pub batch_size: usize,
    /// Parquet compression codec
    pub compression: Compression,
    /// Maximum rows per Parquet row group
    pub max_rows_per_group: usize,
    /// Replacement value for anonymized fields
    pub anonymization_marker: String,
    /// Show a progress bar while writing partitions
    pub show_progress: bool,
    /// Worker threads for loading and writing
    pub num_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed/places"),
            brands: ALLOWED_BRANDS.iter().map(|b| (*b).to_string()).collect(),
            batch_size: get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE),
            compression: Compression::SNAPPY,
            max_rows_per_group: DEFAULT_MAX_ROWS_PER_GROUP,
            anonymization_marker: DEFAULT_ANONYMIZATION_MARKER.to_string(),
            show_progress: true,
            num_threads: num_cpus::get(),
        }
    }
}

impl PipelineConfig {
    /// Create a config reading from `input_dir` and writing to `output_dir`
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Set the brands to load
    #[must_use]
    pub fn with_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brands = brands.into_iter().map(Into::into).collect();
        self
    }

    /// Set the decode batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the Parquet compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the anonymization marker
    #[must_use]
    pub fn with_anonymization_marker(mut self, marker: impl Into<String>) -> Self {
        self.anonymization_marker = marker.into();
        self
    }

    /// Enable or disable the write progress bar
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Set the number of worker threads
    #[must_use]
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    /// Path of the input file for a brand
    #[must_use]
    pub fn input_path(&self, brand: &str) -> PathBuf {
        self.input_dir.join(format!("{brand}-places.json"))
    }

    /// Output directory of the dataset
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_dir
    }
}
