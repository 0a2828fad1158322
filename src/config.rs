// src/config.rs

//! Loads and resolves the configuration recognised by the core
//! (spec.md §6.4): the scheduler's tick/debounce/lock knobs, the
//! health monitor's thresholds, and agent RPC timeouts.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Scheduling coordinator knobs (spec.md §6.4 `scheduler.*`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SchedulerConfig {
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    #[serde(default = "default_lock_acquire_timeout_ms")]
    pub lock_acquire_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            debounce_ms: default_debounce(),
            lock_acquire_timeout_ms: default_lock_acquire_timeout_ms(),
        }
    }
}

impl SchedulerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn lock_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_acquire_timeout_ms)
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}
fn default_debounce() -> u64 {
    100
}
fn default_lock_acquire_timeout_ms() -> u64 {
    5000
}

/// Health monitor knobs (spec.md §6.4 `health.*`), plus the retry
/// backoff schedule decided for Open Question 1 (see DESIGN.md).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_check_interval_sec")]
    pub check_interval_sec: u64,
    #[serde(default = "default_pulling_threshold_sec")]
    pub pulling_threshold_sec: u64,
    #[serde(default = "default_creating_threshold_sec")]
    pub creating_threshold_sec: u64,
    #[serde(with = "humantime_serde::option", default = "default_retry_backoff")]
    pub retry_backoff: Option<Vec<Duration>>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_sec: default_check_interval_sec(),
            pulling_threshold_sec: default_pulling_threshold_sec(),
            creating_threshold_sec: default_creating_threshold_sec(),
            retry_backoff: default_retry_backoff(),
            max_retries: default_max_retries(),
        }
    }
}

impl HealthConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_sec)
    }

    pub fn pulling_threshold(&self) -> Duration {
        Duration::from_secs(self.pulling_threshold_sec)
    }

    pub fn creating_threshold(&self) -> Duration {
        Duration::from_secs(self.creating_threshold_sec)
    }

    pub fn retry_backoff_or_default(&self) -> Vec<Duration> {
        self.retry_backoff.clone().unwrap_or_else(|| default_retry_backoff().unwrap())
    }
}

fn default_check_interval_sec() -> u64 {
    60
}
fn default_pulling_threshold_sec() -> u64 {
    900
}
fn default_creating_threshold_sec() -> u64 {
    600
}
fn default_retry_backoff() -> Option<Vec<Duration>> {
    Some(vec![Duration::from_secs(60), Duration::from_secs(120), Duration::from_secs(240)])
}
fn default_max_retries() -> u32 {
    3
}

/// Agent RPC timeout knobs (spec.md §6.4 `rpc.*`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcConfig {
    #[serde(default = "default_check_timeout_sec")]
    pub check_timeout_sec: u64,
    #[serde(default = "default_control_timeout_sec")]
    pub control_timeout_sec: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            check_timeout_sec: default_check_timeout_sec(),
            control_timeout_sec: default_control_timeout_sec(),
        }
    }
}

impl RpcConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_sec)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_sec)
    }
}

fn default_check_timeout_sec() -> u64 {
    10
}
fn default_control_timeout_sec() -> u64 {
    30
}

/// Logging verbosity, mirrored from the teacher's own `log_level`
/// field, consumed by the binary to build its `EnvFilter`.
fn default_log_level() -> String {
    "info".to_string()
}

/// The top-level configuration the binary loads from a TOML file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub scaling_groups: Vec<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scaling_groups: vec!["default".to_string()],
            log_level: default_log_level(),
            scheduler: SchedulerConfig::default(),
            health: HealthConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads and parses a TOML file, then validates it.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at '{path}'"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML from '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scaling_groups.is_empty() {
            return Err(anyhow!("at least one scaling group must be configured"));
        }
        if self.scheduler.tick_interval.is_zero() {
            return Err(anyhow!("scheduler.tick_interval must be non-zero"));
        }
        if self.health.max_retries == 0 {
            return Err(anyhow!("health.max_retries must be at least 1"));
        }
        Ok(())
    }
}
