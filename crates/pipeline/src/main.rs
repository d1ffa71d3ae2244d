//! Engine RUL Pipeline - Main Entry Point

use anyhow::Context;
use clap::Parser;
use pipeline::{init_logging, LogFormat, Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

/// Forecast engine maintenance windows and train fleet RUL models
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Telemetry file (overrides data.path)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Log level (overrides log_level)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (overrides log_format)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = PipelineConfig::load(args.config.as_deref())
        .context("Failed to load pipeline configuration")?;
    if let Some(data) = args.data {
        config.data.path = data;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }

    init_logging(&config.log_level, config.log_format).context("Failed to set tracing subscriber")?;
    info!("=== Engine RUL Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let output = Pipeline::new(config.clone())
        .run()
        .with_context(|| format!("Pipeline failed for {}", config.data.path.display()))?;

    for model in &output.models {
        info!("{} RMSE: {:.2}", model.name, model.cv_rmse);
    }
    info!(
        "Results written to {}",
        config.output.results_path.display()
    );
    Ok(())
}
