//! CLI command definitions and dispatch.

pub mod config;
pub mod ratelimit;
pub mod routes;
pub mod serve;

use clap::{Parser, Subcommand};

use gatekeeper_core::config::AppConfig;
use gatekeeper_core::error::AppError;

use crate::output::OutputFormat;

/// Gatekeeper: session gating and rate limiting in front of a web app
#[derive(Debug, Parser)]
#[command(name = "gatekeeper", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the Gatekeeper server
    Serve(serve::ServeArgs),
    /// Inspect or reset rate-limit counters
    #[command(name = "ratelimit")]
    RateLimit(ratelimit::RateLimitArgs),
    /// Protected route table
    Routes(routes::RoutesArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.config).await,
            Commands::RateLimit(args) => ratelimit::execute(args, &self.config, self.format).await,
            Commands::Routes(args) => routes::execute(args, &self.config, self.format),
            Commands::Config(args) => config::execute(args, &self.config),
        }
    }
}

/// Helper: load and validate configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    let config = AppConfig::load_file(config_path)?;
    config.validate()?;
    Ok(config)
}
