//! Engine configuration
//!
//! One [`Config`] aggregates the settings for every external collaborator.
//! Everything loads from environment variables; a `.env` file is honored in
//! development via `dotenvy`.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::controller::{
    ControllerConfig, DEFAULT_MAX_QUEUED_RETRIES, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_RUN_TIMEOUT_SECS,
};
use crate::db::DbConfig;
use crate::runner::http::RunnerConfig;
use crate::search::SearchSettings;
use crate::storage::BlobConfig;

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DbConfig,
    pub blob: BlobConfig,
    pub runner: RunnerConfig,
    pub search: SearchSettings,
    pub controller: ControllerConfig,
}

impl Config {
    /// Load the full configuration from the environment.
    pub fn load() -> Result<Self> {
        // Best effort; missing .env just means real env vars are in use.
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(_) => debug!("No .env file found, using process environment"),
        }

        let config = Self {
            database: DbConfig::from_env().context("Failed to load database configuration")?,
            blob: BlobConfig::from_env().context("Failed to load blob store configuration")?,
            runner: RunnerConfig::from_env().context("Failed to load runner configuration")?,
            search: SearchSettings::from_env().context("Failed to load search configuration")?,
            controller: controller_from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.blob.validate()?;

        if self.controller.poll_interval.is_zero() {
            anyhow::bail!("Poll interval must be positive");
        }
        if self.controller.run_timeout < self.controller.poll_interval {
            anyhow::bail!("Run timeout must be at least one poll interval");
        }

        Ok(())
    }
}

fn controller_from_env() -> ControllerConfig {
    let poll_secs = std::env::var("RUN_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    let timeout_secs = std::env::var("RUN_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RUN_TIMEOUT_SECS);
    let max_queued_retries = std::env::var("RUN_MAX_QUEUED_RETRIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_QUEUED_RETRIES);

    ControllerConfig {
        poll_interval: Duration::from_secs(poll_secs),
        run_timeout: Duration::from_secs(timeout_secs),
        max_queued_retries,
    }
}
