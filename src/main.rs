use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ec_compass::agent::ChatCompletionAgent;
use ec_compass::config::Settings;
use ec_compass::pipeline;

/// EC Compass - product comparison CLI.
#[derive(Parser, Debug)]
#[command(name = "ec-compass", version, about)]
struct Cli {
    /// Path to the settings file (YAML)
    #[arg(long, default_value = "settings.yaml")]
    config: PathBuf,

    /// Directory for the report and scrape artifacts
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "ec_compass=debug,info"
    } else {
        "ec_compass=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    let artifacts = pipeline::run(&settings, &ChatCompletionAgent, &cli.out_dir)
        .await
        .context("pipeline run failed")?;

    println!("report saved to {}", artifacts.report_path.display());
    Ok(())
}
