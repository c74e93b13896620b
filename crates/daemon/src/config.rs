// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from environment variables with defaults
//! (spec.md non-goal: no CLI flags, no file format).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory: $HOME is not set")]
    NoStateDir,
}

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Batch Engine window (spec-fixed default of 10ms, overridable for tests).
    pub batch_window: Duration,
    /// Root state directory, currently unused beyond logging -- the KVS and
    /// journal this daemon wires up are [`jobcore_adapters::NoopCollaborators`]
    /// until a real durable store is plugged in.
    pub state_dir: PathBuf,
    /// `tracing-subscriber` env-filter directive.
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// - `JOBCORE_BATCH_WINDOW_MS` (default 10)
    /// - `JOBCORE_STATE_DIR` > `XDG_STATE_HOME/jobcore` > `~/.local/state/jobcore`
    /// - `RUST_LOG` (default `info`)
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            batch_window: batch_window(),
            state_dir: state_dir()?,
            log_level: log_level(),
        })
    }
}

/// Matches [`jobcore_storage::BatchEngine::DEFAULT_WINDOW`] (spec.md §4.2).
const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(10);

fn batch_window() -> Duration {
    std::env::var("JOBCORE_BATCH_WINDOW_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_BATCH_WINDOW)
}

fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("JOBCORE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jobcore"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jobcore"))
}

fn log_level() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
