//! Rate-limit counter CLI commands.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use gatekeeper_auth::{RateLimitOptions, RateLimitResult, RateLimiter, WindowSize};
use gatekeeper_cache::CacheManager;
use gatekeeper_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for rate-limit commands
#[derive(Debug, Args)]
pub struct RateLimitArgs {
    /// Rate-limit subcommand
    #[command(subcommand)]
    pub command: RateLimitCommand,
}

/// Rate-limit subcommands
#[derive(Debug, Subcommand)]
pub enum RateLimitCommand {
    /// Show the current window for a key without consuming budget
    Status {
        /// Counter key, e.g. `203.0.113.9:/dashboard`
        key: String,
        /// Requests allowed per window
        #[arg(long)]
        requests: u64,
        /// Window length, e.g. `60s`, `1m`, `1h`
        #[arg(long)]
        window: String,
    },
    /// Delete every window counter for a key
    Clear {
        /// Counter key
        key: String,
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Status display row
#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    /// Counter key
    key: String,
    /// Within budget
    success: bool,
    /// Remaining
    remaining: u64,
    /// Window end (epoch ms)
    reset: i64,
}

impl StatusRow {
    fn new(key: &str, result: &RateLimitResult) -> Self {
        Self {
            key: key.to_string(),
            success: result.success,
            remaining: result.remaining,
            reset: result.reset,
        }
    }
}

/// Execute rate-limit commands
pub async fn execute(
    args: &RateLimitArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    let limiter = RateLimiter::new(cache, Duration::from_millis(config.cache.command_timeout_ms));

    match &args.command {
        RateLimitCommand::Status {
            key,
            requests,
            window,
        } => {
            let options = RateLimitOptions::new(*requests, WindowSize::parse(window)?);
            let result = limiter.status(key, &options).await?;
            output::print_item(&StatusRow::new(key, &result), format);
        }
        RateLimitCommand::Clear { key, yes } => {
            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete all rate-limit windows for '{key}'?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let removed = limiter.clear(key).await?;
            output::print_success(&format!("Removed {removed} window counter(s) for '{key}'"));
        }
    }

    Ok(())
}
