//! CLI argument definitions using clap
//!
//! Commands:
//! - insightdb query --config <path> [--file <query.json>]
//! - insightdb datasets --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// InsightDB - A strict, deterministic query engine over course and room datasets
#[derive(Parser, Debug)]
#[command(name = "insightdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a single query and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Read the query from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the datasets in the data directory
    Datasets {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
