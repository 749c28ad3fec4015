//! Logging utilities
//!
//! Standardized log lines for file operations.

use std::path::Path;

use arrow::record_batch::RecordBatch;

/// Log an operation start with consistent format
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Past-tense description of the operation
/// * `path` - Path of the file or directory that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<std::time::Duration>,
) {
    if let Some(duration) = elapsed {
        log::info!(
            "Successfully {} {} items at {} in {:?}",
            operation,
            items,
            path.display(),
            duration
        );
    } else {
        log::info!(
            "Successfully {} {} items at {}",
            operation,
            items,
            path.display()
        );
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}

/// Log row and column counts at info level, the field list at debug level
pub fn log_batch_summary(label: &str, batch: &RecordBatch) {
    log::info!(
        "{label}: {} rows, {} columns",
        batch.num_rows(),
        batch.num_columns()
    );
    for field in batch.schema().fields() {
        log::debug!("  - {} ({})", field.name(), field.data_type());
    }
}
