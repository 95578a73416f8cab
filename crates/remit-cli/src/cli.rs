//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Remit - Medical bill analysis and navigation planning
#[derive(Parser)]
#[command(name = "remit")]
#[command(about = "Analyze medical bills and build a savings action plan", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a full navigation plan from a financial profile
    Plan {
        /// Financial profile JSON file
        profile: PathBuf,

        /// Engine configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analysis date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Emit the full plan as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// Show only the risk assessment for a profile
    Risk {
        /// Financial profile JSON file
        profile: PathBuf,

        /// Engine configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analysis date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Emit the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show billing issues and negotiation opportunities for a profile
    Bills {
        /// Financial profile JSON file
        profile: PathBuf,

        /// Engine configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analysis date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Emit the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a profile file without running any analysis
    Validate {
        /// Financial profile JSON file
        profile: PathBuf,
    },
}
