//! Remit CLI - Medical bill analysis and navigation planning
//!
//! Usage:
//!   remit plan profile.json            Generate a full action plan
//!   remit risk profile.json            Show the risk assessment only
//!   remit bills profile.json --json    Billing issues as JSON
//!   remit validate profile.json        Check a profile file

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Plan {
            profile,
            config,
            date,
            json,
        } => commands::cmd_plan(&profile, config.as_deref(), date.as_deref(), json),
        Commands::Risk {
            profile,
            config,
            date,
            json,
        } => commands::cmd_risk(&profile, config.as_deref(), date.as_deref(), json),
        Commands::Bills {
            profile,
            config,
            date,
            json,
        } => commands::cmd_bills(&profile, config.as_deref(), date.as_deref(), json),
        Commands::Validate { profile } => commands::cmd_validate(&profile),
    }
}
