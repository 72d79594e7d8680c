//! Subcommands of the `fundwise` binary.
//!
//! - `researcher`: budget, funders and grant plan for one idea
//! - `admin`: rank a portfolio of projects
//! - `adjacent`: fields an idea could pivot into
//! - `options`: campuses, fields and funders to build a request from
//! - `validate`: sanity-check the reference artifacts

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use fundwise_ranker::{DecisionRequest, DecisionService, PortfolioRequest};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncReadExt;

#[derive(Subcommand)]
pub enum Command {
    /// Recommend a budget, funders and a grant plan for one research idea
    Researcher(RequestArgs),

    /// Prioritise a portfolio of projects by need and expected inflow
    Admin(RequestArgs),

    /// Rank fields adjacent to a field code by pivot ease
    Adjacent(AdjacentArgs),

    /// List campuses, fields and funders for building a request
    Options,

    /// Check the reference artifacts and report record counts
    Validate,
}

#[derive(Args)]
pub struct RequestArgs {
    /// JSON request file, or `-` for stdin
    #[arg(short, long)]
    pub request: PathBuf,
}

#[derive(Args)]
pub struct AdjacentArgs {
    /// Field code to pivot from
    #[arg(short, long)]
    pub field: String,

    /// Number of adjacent fields (clamped to the configured window)
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,
}

async fn read_request<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read request from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read request {}", path.display()))?
    };
    serde_json::from_str(&raw).context("request is not valid JSON for this command")
}

pub async fn run(service: &DecisionService, command: Command) -> anyhow::Result<Value> {
    let value = match command {
        Command::Researcher(args) => {
            let request: DecisionRequest = read_request(&args.request).await?;
            serde_json::to_value(service.researcher(&request).await?)?
        }
        Command::Admin(args) => {
            let request: PortfolioRequest = read_request(&args.request).await?;
            serde_json::to_value(service.admin(&request).await?)?
        }
        Command::Adjacent(args) => {
            serde_json::to_value(service.adjacent(&args.field, args.top_n).await?)?
        }
        Command::Options => serde_json::to_value(service.options().await?)?,
        Command::Validate => serde_json::to_value(service.validate().await?)?,
    };
    Ok(value)
}
