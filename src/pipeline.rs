//! The load, conform, union, transform and save pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::brand::{BRAND_COLUMN, validate_brand};
use crate::config::{PARTITION_COLUMN, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::io::json::read_json_records;
use crate::io::parquet::{WriteSummary, write_partitioned};
use crate::schema::{check_conformance, conform_batch, superset_schema};
use crate::transform::transform_chunked;
use crate::utils::arrow::{constant_string_array, upsert_column};
use crate::utils::logging::log_batch_summary;

/// Per-brand datasets, `None` where loading failed
pub type BrandFrames = BTreeMap<String, Option<RecordBatch>>;

/// Result of a pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// Loaded dataset per configured brand
    pub frames: BrandFrames,
    /// Rows in the unioned, transformed dataset
    pub rows: usize,
    /// What was written
    pub write: WriteSummary,
}

impl PipelineReport {
    /// Brands that loaded successfully
    #[must_use]
    pub fn loaded_brands(&self) -> Vec<&str> {
        self.frames
            .iter()
            .filter(|(_, frame)| frame.is_some())
            .map(|(brand, _)| brand.as_str())
            .collect()
    }

    /// Brands whose load failed
    #[must_use]
    pub fn failed_brands(&self) -> Vec<&str> {
        self.frames
            .iter()
            .filter(|(_, frame)| frame.is_none())
            .map(|(brand, _)| brand.as_str())
            .collect()
    }
}

/// Load one brand's records and tag them with a `brand` column
///
/// Fails for brands outside the allow-list and for missing input files.
/// Errors are logged before being returned.
pub fn load_brand(config: &PipelineConfig, brand: &str) -> Result<RecordBatch> {
    let result = load_brand_inner(config, brand);
    if let Err(e) = &result {
        error!("Failed to load brand '{brand}': {e}");
    }
    result
}

fn load_brand_inner(config: &PipelineConfig, brand: &str) -> Result<RecordBatch> {
    let brand = validate_brand(brand)?;
    let path = config.input_path(brand);
    if !path.is_file() {
        return Err(PipelineError::FileNotFound { path });
    }

    let batch = read_json_records(&path, config.batch_size)?;
    let brands = constant_string_array(brand, batch.num_rows());
    upsert_column(&batch, BRAND_COLUMN, brands)
}

/// Load every configured brand in parallel
///
/// Entries are keyed by the canonical brand name, so spellings that differ
/// only in case or surrounding whitespace are loaded once. Names outside the
/// allow-list keep their configured spelling. A brand that fails to load is
/// kept in the map as `None`.
pub fn load_all(config: &PipelineConfig) -> BrandFrames {
    let mut seen = FxHashSet::default();
    let mut unique = Vec::with_capacity(config.brands.len());
    for brand in &config.brands {
        let key = validate_brand(brand).map_or_else(|_| brand.clone(), str::to_string);
        if seen.insert(key.clone()) {
            unique.push((key, brand.as_str()));
        } else {
            warn!("Brand '{brand}' is configured more than once, loading it once");
        }
    }

    unique
        .into_par_iter()
        .map(|(key, brand)| {
            let frame = load_brand(config, brand).ok();
            (key, frame)
        })
        .collect()
}

/// Conform the loaded frames to their superset schema and union them
pub fn union_frames(frames: &BrandFrames) -> Result<RecordBatch> {
    let loaded: Vec<(&String, &RecordBatch)> = frames
        .iter()
        .filter_map(|(brand, frame)| frame.as_ref().map(|f| (brand, f)))
        .collect();

    if loaded.is_empty() {
        return Err(PipelineError::NoData(
            "none of the configured brands could be loaded".to_string(),
        ));
    }

    let schemas: Vec<SchemaRef> = loaded.iter().map(|(_, f)| f.schema()).collect();
    let target = Arc::new(superset_schema(&schemas)?);

    let mut conformed = Vec::with_capacity(loaded.len());
    for (brand, frame) in loaded {
        let report = check_conformance(&frame.schema(), &target);
        if !report.missing.is_empty() {
            info!(
                "Brand '{brand}' lacks {} columns, filling with nulls: {}",
                report.missing.len(),
                report.missing.join(", ")
            );
        }
        for adaptation in &report.adaptations {
            debug!(
                "Brand '{brand}': adapting '{}' from {:?} to {:?}",
                adaptation.column, adaptation.source_type, adaptation.target_type
            );
        }
        for issue in &report.incompatible {
            warn!(
                "Brand '{brand}': column '{}' has incompatible type {:?} (expected {:?})",
                issue.column, issue.source_type, issue.target_type
            );
        }
        conformed.push(conform_batch(frame, &target)?);
    }

    Ok(concat_batches(&target, &conformed)?)
}

/// Run the whole pipeline with `config`
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()?;
    pool.install(|| run_stages(config))
}

fn run_stages(config: &PipelineConfig) -> Result<PipelineReport> {
    let start = Instant::now();
    info!("Loading brands: {}", config.brands.join(", "));

    let frames = load_all(config);
    let unioned = union_frames(&frames)?;
    log_batch_summary("Unioned dataset", &unioned);

    let transformed = transform_chunked(&unioned, config)?;
    log_batch_summary("Transformed dataset", &transformed);

    let write = write_partitioned(&transformed, &config.output_dir, PARTITION_COLUMN, config)?;

    info!(
        "Pipeline finished in {:?}: {} rows in {} partitions",
        start.elapsed(),
        write.rows,
        write.partitions
    );

    Ok(PipelineReport {
        frames,
        rows: transformed.num_rows(),
        write,
    })
}
