//! CLI command implementations
//!
//! Commands are read-only: they open an existing version log, answer one
//! question about it and print one JSON object.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::{Attributes, Record};
use crate::observability::{Logger, Severity};
use crate::store::FileVersionStore;
use crate::trail::{Trail, TrailConfig};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Version log to inspect
    #[serde(default)]
    pub log_path: Option<String>,

    /// Trail settings
    #[serde(flatten)]
    pub trail: TrailConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.trail.validate()?;

        Ok(config)
    }

    /// The log to read: `--log` wins over `log_path`.
    pub fn resolve_log_path(&self, cli_log: Option<PathBuf>) -> CliResult<PathBuf> {
        cli_log
            .or_else(|| self.log_path.as_ref().map(PathBuf::from))
            .ok_or_else(CliError::missing_log_path)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match run_command(cli) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<Value> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // stdout carries the response; only warnings and worse are logged.
    let mut trail_config = config.trail.clone();
    let severity = trail_config.severity()?.max(Severity::Warn);
    trail_config.log_level = severity.as_str().to_string();
    Logger::set_min_severity(severity);

    let log_path = config.resolve_log_path(cli.log)?;
    match cli.command {
        Command::History { item_type, item_id } => {
            history(&log_path, &trail_config, &item_type, &item_id)
        }
        Command::At {
            item_type,
            item_id,
            time,
        } => at(&log_path, &trail_config, &item_type, &item_id, &time),
        Command::Verify => verify(&log_path),
    }
}

/// Every version of one item, oldest first, with decoded changesets.
pub fn history(
    log_path: &Path,
    config: &TrailConfig,
    item_type: &str,
    item_id: &str,
) -> CliResult<Value> {
    let trail = open_trail(log_path, config)?;
    let record = Record::from_persisted(item_type, item_id, Attributes::new());

    let mut versions = Vec::new();
    for version in trail.versions(&record)? {
        let mut entry = serde_json::to_value(&version)?;
        let changeset = trail.changeset(&version)?;
        if let Value::Object(map) = &mut entry {
            map.insert("changeset".to_string(), serde_json::to_value(changeset)?);
        }
        versions.push(entry);
    }

    Ok(json!({
        "item_type": item_type,
        "item_id": item_id,
        "count": versions.len(),
        "versions": versions,
    }))
}

/// The state of one item at `time`.
///
/// `exists: false` means the item had not been created yet. `current: true`
/// means nothing changed after `time`, so the state is whatever the host
/// holds now; the log does not contain it.
pub fn at(
    log_path: &Path,
    config: &TrailConfig,
    item_type: &str,
    item_id: &str,
    time: &str,
) -> CliResult<Value> {
    let at = DateTime::parse_from_rfc3339(time)
        .map_err(|e| CliError::invalid_argument(format!("Invalid --time '{}': {}", time, e)))?
        .with_timezone(&Utc);

    let trail = open_trail(log_path, config)?;
    let record = Record::from_persisted(item_type, item_id, Attributes::new());

    let answer = match trail.version_at(&record, at)? {
        None => json!({
            "exists": false,
            "current": false,
            "state": Value::Null,
        }),
        Some(state) if state.is_live() => json!({
            "exists": true,
            "current": true,
            "state": Value::Null,
        }),
        Some(state) => json!({
            "exists": true,
            "current": false,
            "state": state.attributes(),
            "version_id": state.version().map(|v| v.id().value()),
        }),
    };

    Ok(json!({
        "item_type": item_type,
        "item_id": item_id,
        "at": at.to_rfc3339(),
        "result": answer,
    }))
}

/// Validate every line of the log.
pub fn verify(log_path: &Path) -> CliResult<Value> {
    let store = open_store(log_path)?;

    Ok(json!({
        "path": log_path.display().to_string(),
        "items": store.item_count(),
        "versions": store.len(),
        "status": "valid",
    }))
}

fn open_store(log_path: &Path) -> CliResult<FileVersionStore> {
    if !log_path.exists() {
        return Err(CliError::io_error(format!(
            "Version log not found: {}",
            log_path.display()
        )));
    }
    Ok(FileVersionStore::open(log_path)?)
}

fn open_trail(log_path: &Path, config: &TrailConfig) -> CliResult<Trail> {
    let store = open_store(log_path)?;
    Ok(Trail::with_config(Arc::new(store), config.clone())?)
}
