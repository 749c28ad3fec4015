use std::process::ExitCode;

use anyhow::Context;
use log::{error, info, warn};
use places_etl::{PipelineConfig, run};

fn try_main() -> anyhow::Result<()> {
    let config = PipelineConfig::default();
    info!(
        "Reading from {} and writing to {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    let report = run(&config).context("places pipeline failed")?;

    for brand in report.failed_brands() {
        warn!("Brand '{brand}' was skipped");
    }
    info!(
        "Wrote {} rows from brands [{}] into {} partitions",
        report.rows,
        report.loaded_brands().join(", "),
        report.write.partitions
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
