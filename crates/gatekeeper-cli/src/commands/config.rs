//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use gatekeeper_auth::RouteTable;
use gatekeeper_core::error::AppError;
use gatekeeper_core::redact::mask_url_password;

use crate::output;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Validate configuration file, including the route table
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config_path: &str) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Validate => {
            let config = super::load_config(config_path)?;
            let routes = RouteTable::from_config(&config.routes)?;

            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv(
                "Server",
                &format!("{}:{}", config.server.host, config.server.port),
            );
            output::print_kv("Session store", &config.session.store);
            if config.session.store == "postgres" {
                output::print_kv("Database", &mask_url_password(&config.database.url));
            }
            output::print_kv("Counter store", &config.cache.provider);
            if config.cache.provider == "redis" {
                output::print_kv("Redis", &mask_url_password(&config.cache.redis.url));
            }
            output::print_kv("Protected routes", &routes.len().to_string());
        }
    }

    Ok(())
}
