//! ---
//! vigia_section: "01-core-functionality"
//! vigia_subsection: "module"
//! vigia_type: "source"
//! vigia_scope: "code"
//! vigia_description: "Shared primitives and utilities for the monitoring runtime."
//! vigia_version: "v0.0.0-prealpha"
//! vigia_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_metrics_enabled() -> bool {
    false
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9899))
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_trend_snapshot_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_scenario_roll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_synthetic_alert_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_scenario_probability() -> f64 {
    0.12
}

fn default_synthetic_alert_probability() -> f64 {
    0.3
}

fn default_max_general_scenarios() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_feed_directory() -> PathBuf {
    PathBuf::from("target/vigia-store")
}

fn default_feed_key() -> String {
    "vigia-alerts".to_owned()
}

fn default_feed_capacity() -> usize {
    20
}

/// Primary configuration object for the Vigia runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub alerts: AlertFeedConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "VIGIA_CONFIG";

    /// Load configuration from disk, respecting the `VIGIA_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Unlike an explicit `VIGIA_CONFIG` path, missing candidates are not an
    /// error: the built-in defaults describe a complete simulation setup.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        let config = Self::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.alerts.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            listen: default_metrics_listen(),
        }
    }
}

/// Cadences and probabilities driving the telemetry simulation.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval", rename = "tick_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    #[serde(
        default = "default_trend_snapshot_interval",
        rename = "trend_snapshot_interval_ms"
    )]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub trend_snapshot_interval: Duration,
    #[serde(
        default = "default_scenario_roll_interval",
        rename = "scenario_roll_interval_ms"
    )]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub scenario_roll_interval: Duration,
    #[serde(
        default = "default_synthetic_alert_interval",
        rename = "synthetic_alert_interval_ms"
    )]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub synthetic_alert_interval: Duration,
    #[serde(default = "default_true")]
    pub scenarios_enabled: bool,
    #[serde(default = "default_scenario_probability")]
    pub scenario_probability: f64,
    #[serde(default = "default_max_general_scenarios")]
    pub max_general_scenarios: usize,
    #[serde(default = "default_true")]
    pub synthetic_alerts_enabled: bool,
    #[serde(default = "default_synthetic_alert_probability")]
    pub synthetic_alert_probability: f64,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            trend_snapshot_interval: default_trend_snapshot_interval(),
            scenario_roll_interval: default_scenario_roll_interval(),
            synthetic_alert_interval: default_synthetic_alert_interval(),
            scenarios_enabled: true,
            scenario_probability: default_scenario_probability(),
            max_general_scenarios: default_max_general_scenarios(),
            synthetic_alerts_enabled: true,
            synthetic_alert_probability: default_synthetic_alert_probability(),
            random_seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, interval) in [
            ("tick_interval_ms", self.tick_interval),
            ("trend_snapshot_interval_ms", self.trend_snapshot_interval),
            ("scenario_roll_interval_ms", self.scenario_roll_interval),
            ("synthetic_alert_interval_ms", self.synthetic_alert_interval),
        ] {
            if interval.is_zero() {
                return Err(anyhow!("simulation.{} must be greater than zero", name));
            }
        }
        for (name, probability) in [
            ("scenario_probability", self.scenario_probability),
            ("synthetic_alert_probability", self.synthetic_alert_probability),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(anyhow!(
                    "simulation.{} must lie within [0, 1], got {}",
                    name,
                    probability
                ));
            }
        }
        if self.max_general_scenarios == 0 {
            return Err(anyhow!(
                "simulation.max_general_scenarios must be at least 1"
            ));
        }
        Ok(())
    }
}

/// Location and bounds of the persisted alert feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFeedConfig {
    #[serde(default = "default_feed_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_feed_key")]
    pub key: String,
    #[serde(default = "default_feed_capacity")]
    pub capacity: usize,
}

impl Default for AlertFeedConfig {
    fn default() -> Self {
        Self {
            directory: default_feed_directory(),
            key: default_feed_key(),
            capacity: default_feed_capacity(),
        }
    }
}

impl AlertFeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(anyhow!("alerts.capacity must be at least 1"));
        }
        if self.key.trim().is_empty() {
            return Err(anyhow!("alerts.key must not be empty"));
        }
        Ok(())
    }
}
