//! Engine configuration
//!
//! Loaded from a YAML file with per-field defaults, so a partial file only
//! overrides what it names. The search order is an explicit `--config` path,
//! then `./rotor.yml`, then `{config_dir}/rotor/rotor.yml`; with no file
//! found the defaults apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotorError};
use crate::guard::RetryPolicy;
use crate::phases::regen::{MAX_POOL_SIZE, MIN_POOL_SIZE};

fn default_resource_name() -> String {
    "DEMO".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_trading_duration_secs() -> u64 {
    60
}

fn default_collection_bound_secs() -> u64 {
    30
}

fn default_regeneration_bound_secs() -> u64 {
    60
}

fn default_distribution_bound_secs() -> u64 {
    30
}

fn default_throttle_ms() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    8_000
}

/// Engine configuration, YAML-backed with per-field defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Resource the session trades
    #[serde(default = "default_resource_name")]
    pub resource_name: String,

    /// Worker pool size, in [1,100]
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Length of the Trading phase per lap
    #[serde(default = "default_trading_duration_secs")]
    pub trading_duration_secs: u64,

    /// Deadline per guarded ledger call during collection
    #[serde(default = "default_collection_bound_secs")]
    pub collection_bound_secs: u64,

    /// Deadline for the whole regeneration batch
    #[serde(default = "default_regeneration_bound_secs")]
    pub regeneration_bound_secs: u64,

    /// Deadline per guarded transfer during distribution
    #[serde(default = "default_distribution_bound_secs")]
    pub distribution_bound_secs: u64,

    /// Minimum spacing between consecutive ledger calls in a phase
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles per attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Cap on the retry backoff
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Stop after this many laps; None runs until stopped
    #[serde(default)]
    pub max_laps: Option<u64>,

    /// Directory for session checkpoint documents
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resource_name: default_resource_name(),
            pool_size: default_pool_size(),
            trading_duration_secs: default_trading_duration_secs(),
            collection_bound_secs: default_collection_bound_secs(),
            regeneration_bound_secs: default_regeneration_bound_secs(),
            distribution_bound_secs: default_distribution_bound_secs(),
            throttle_ms: default_throttle_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_laps: None,
            session_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration, searching the standard locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|e| RotorError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("rotor.yml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("rotor").join("rotor.yml"));
        }
        paths
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.resource_name.trim().is_empty() {
            return Err(RotorError::Config("resource_name must not be empty".into()));
        }
        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&self.pool_size) {
            return Err(RotorError::Config(format!(
                "pool_size {} outside [{},{}]",
                self.pool_size, MIN_POOL_SIZE, MAX_POOL_SIZE
            )));
        }
        if self.collection_bound_secs == 0
            || self.regeneration_bound_secs == 0
            || self.distribution_bound_secs == 0
        {
            return Err(RotorError::Config(
                "phase bounds must be positive".into(),
            ));
        }
        if let Some(0) = self.max_laps {
            return Err(RotorError::Config("max_laps must be positive when set".into()));
        }
        Ok(())
    }

    /// Directory for session documents, defaulting under the user data dir.
    pub fn session_dir(&self) -> PathBuf {
        match &self.session_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rotor")
                .join("sessions"),
        }
    }

    pub fn trading_duration(&self) -> Duration {
        Duration::from_secs(self.trading_duration_secs)
    }

    pub fn collection_bound(&self) -> Duration {
        Duration::from_secs(self.collection_bound_secs)
    }

    pub fn regeneration_bound(&self) -> Duration {
        Duration::from_secs(self.regeneration_bound_secs)
    }

    pub fn distribution_bound(&self) -> Duration {
        Duration::from_secs(self.distribution_bound_secs)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}
