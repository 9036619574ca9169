//! Route table CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use gatekeeper_auth::{RouteRule, RouteTable};
use gatekeeper_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for route commands
#[derive(Debug, Args)]
pub struct RoutesArgs {
    /// Routes subcommand
    #[command(subcommand)]
    pub command: RoutesCommand,
}

/// Routes subcommands
#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List protected routes in match order
    List,
}

/// Route display row
#[derive(Debug, Serialize, Tabled)]
struct RouteRow {
    /// Path prefix
    path: String,
    /// Allowed roles
    roles: String,
    /// Budget
    rate_limit: String,
}

impl From<&RouteRule> for RouteRow {
    fn from(rule: &RouteRule) -> Self {
        let roles = match &rule.roles {
            Some(roles) => roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            None => "any".to_string(),
        };
        let rate_limit = match &rule.rate_limit {
            Some(limit) => format!("{} / {}", limit.requests, limit.window),
            None => "none".to_string(),
        };
        Self {
            path: rule.path.clone(),
            roles,
            rate_limit,
        }
    }
}

/// Execute route commands
pub fn execute(args: &RoutesArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let table = RouteTable::from_config(&config.routes)?;

    match &args.command {
        RoutesCommand::List => {
            let rows: Vec<RouteRow> = table.rules().iter().map(RouteRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
