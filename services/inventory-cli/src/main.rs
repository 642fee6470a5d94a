//! Inventory CLI
//!
//! Fetches one page of an inventory collection and prints it as JSON:
//! 1. Loads config (file, env overlay) and the pre-issued access token
//! 2. Restores the session through the static identity provider
//! 3. Runs a single list fetch through the authenticated gateway
//!
//! Exits with status 1 when the fetch fails.

mod app;
mod cli;
mod config;
mod metrics;
mod static_identity;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{CliArgs, USAGE};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr; stdout carries the result document
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}\n{USAGE}");
            std::process::exit(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    let Some(resource) = args.resource else {
        anyhow::bail!("missing resource argument");
    };

    let prometheus = if args.metrics {
        Some(metrics::install_recorder().context("failed to install Prometheus recorder")?)
    } else {
        None
    };

    let config_path = Config::resolve_path(args.config_path.as_deref());
    let config = if config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else if args.config_path.is_some() {
        anyhow::bail!("config file {} does not exist", config_path.display());
    } else {
        warn!(path = %config_path.display(), "config file not found, using defaults");
        Config::from_env().context("invalid environment configuration")?
    };

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        has_token = config.api.access_token.is_some(),
        resource = %resource,
        "configuration loaded"
    );

    let client = app::connect(&config).await?;
    let report = app::fetch_page(client, resource, &args).await;

    println!("{}", serde_json::to_string_pretty(&report.body)?);

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
