//! Error handling for the places pipeline.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors raised while loading, reshaping or writing location data
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Brand is not on the allow-list
    #[error("Invalid brand '{brand}'. Must be one of: {}", .allowed.join(", "))]
    InvalidBrand {
        /// The rejected brand name
        brand: String,
        /// Brands that would have been accepted
        allowed: Vec<String>,
    },

    /// Input file for a brand does not exist
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error building or converting Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error encoding or decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Schemas that cannot be reconciled
    #[error("Schema error: {0}")]
    Schema(String),

    /// Nothing was loaded, so there is nothing to union or write
    #[error("No data: {0}")]
    NoData(String),
}

impl PipelineError {
    /// Create a schema error from any message
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
