//! CLI command implementations
//!
//! Each command loads the config, applies its log level, runs once and
//! writes exactly one JSON response to stdout.

use std::path::Path;

use serde_json::Value;

use crate::dataset::{DatasetStore, FileStore};
use crate::executor::QueryEngine;
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query { config, file } => query(&config, file.as_deref()),
        Command::Datasets { config } => datasets(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("data_dir", config.data_dir.as_str())],
    );
    Ok(config)
}

/// Execute a single query against the configured data directory.
///
/// A rejected query is written as an error response and is not a CLI
/// failure.
pub fn query(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = FileStore::new(config.data_path());
    let metrics = MetricsRegistry::new();
    let engine = QueryEngine::new(&store).with_metrics(&metrics);

    let request = read_request(file)?;

    match engine.execute_json(&request) {
        Ok(rows) => write_response(Value::Array(rows.into_iter().map(Value::Object).collect())),
        Err(err) => write_error(err.code().code(), err.message()),
    }
}

/// List the datasets in the configured data directory
pub fn datasets(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = FileStore::new(config.data_path());

    let listing = store
        .list()
        .map_err(|e| CliError::io_error(format!("Failed to list datasets: {}", e)))?;

    let count = listing.len().to_string();
    log_event_with_fields(Event::DatasetsListed, &[("count", count.as_str())]);

    write_response(serde_json::to_value(listing)?)
}
