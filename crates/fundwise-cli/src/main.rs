//! Fundwise — Funding recommendation engine
//! Entry point for the `fundwise` binary.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fundwise_config::EngineConfig;
use fundwise_data::JsonArtifactSource;
use fundwise_ranker::DecisionService;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::Command;

#[derive(Parser)]
#[command(name = "fundwise")]
#[command(about = "Funding recommendations, portfolio planning and adjacent-field discovery")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults to $FUNDWISE_CONFIG, then ./fundwise.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the reference artifacts (overrides config file)
    #[arg(short, long, global = true, env = "FUNDWISE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::load().context("failed to load config")?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fundwise=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(data_dir = %config.data.dir.display(), "Fundwise starting");

    let source = Arc::new(JsonArtifactSource::new(config.data.clone()));
    let service = DecisionService::new(source, config);

    let output = commands::run(&service, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
