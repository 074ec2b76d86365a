//! Common utilities for all binaries
//!
//! CLI parsing and config bootstrap shared by every entry point in this
//! workspace.

use anyhow::{Context, Result};
use clap::Parser;
use spread_core::config::{Bootstrap, Config};
use spread_core::logger::init_logger;

/// Common CLI arguments for all binaries. Exactly one of `config` /
/// `config_url` must be given — `bootstrap()` enforces that before
/// anything tries to load it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Path to a local JSON config file.
    #[arg(long)]
    pub config: Option<String>,

    /// URL of an HTTP endpoint serving the JSON config document.
    #[arg(long)]
    pub config_url: Option<String>,

    /// Log level directive, overriding whatever the config document sets.
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit structured JSON logs instead of plain text.
    #[arg(long)]
    pub json_logs: bool,
}

impl CommonArgs {
    /// Resolve the CLI's config source into a [`Bootstrap`] record.
    pub fn bootstrap(&self) -> Result<Bootstrap> {
        match (&self.config, &self.config_url) {
            (Some(path), None) => Ok(Bootstrap::File { path: path.clone() }),
            (None, Some(url)) => Ok(Bootstrap::Api { url: url.clone() }),
            (Some(_), Some(_)) => anyhow::bail!("pass exactly one of --config or --config-url, not both"),
            (None, None) => anyhow::bail!("pass one of --config <path> or --config-url <url>"),
        }
    }
}

/// Load and validate the config document, then install the global tracing
/// subscriber using the CLI's overrides where given and the config
/// document's own settings otherwise.
pub fn bootstrap(args: &CommonArgs) -> Result<Config> {
    let bootstrap = args.bootstrap()?;
    let config = Config::load(&bootstrap).context("failed to load configuration")?;

    let log_level = args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info");
    init_logger(log_level, args.json_logs || config.json_logs);

    Ok(config)
}
