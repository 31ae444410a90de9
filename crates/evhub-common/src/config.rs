//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Layered configuration loading and validation."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use evhub_fleet::{default_fleet, ChargingStation, CompletionPolicy, DEFAULT_MAX_PROGRESS_STEP};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;
use crate::time::offset_from_minutes;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_dashboard_interval() -> Duration {
    Duration::from_millis(3000)
}

fn default_chart_interval() -> Duration {
    Duration::from_millis(10_000)
}

fn default_max_progress_step() -> f64 {
    DEFAULT_MAX_PROGRESS_STEP
}

fn default_mapbox_style() -> String {
    "mapbox/streets-v12".to_owned()
}

/// Primary configuration object for the Solar EV Hub runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub map: MapConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults are in use.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "EVHUB_CONFIG";

    /// Load configuration from disk, respecting the `EVHUB_CONFIG` override.
    ///
    /// An explicit override must exist. Otherwise the first existing
    /// candidate wins, and defaults apply when none exist.
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

        let inspected = candidates
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        debug!(%inspected, "no configuration file found, using defaults");
        let config = AppConfig::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    /// Load from an explicitly requested file, or fall back to
    /// [`AppConfig::load_with_source`]. An explicit path that cannot be
    /// read is an error rather than a silent switch to defaults.
    pub fn load_explicit_or<P: AsRef<Path>>(
        explicit: Option<&Path>,
        candidates: &[P],
    ) -> Result<LoadedAppConfig> {
        match explicit {
            Some(path) => Ok(LoadedAppConfig {
                config: Self::from_path(path)?,
                source: Some(path.to_path_buf()),
            }),
            None => Self::load_with_source(candidates),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.refresh.validate()?;
        self.simulation.validate()?;
        self.fleet.validate()?;
        self.location.validate()?;
        self.map.validate()?;
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

/// Cadence of the two independent refresh timers.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(rename = "dashboard_interval_ms", default = "default_dashboard_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub dashboard_interval: Duration,
    #[serde(rename = "chart_interval_ms", default = "default_chart_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub chart_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dashboard_interval: default_dashboard_interval(),
            chart_interval: default_chart_interval(),
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dashboard_interval.is_zero() {
            return Err(anyhow!("refresh.dashboard_interval_ms must be greater than zero"));
        }
        if self.chart_interval.is_zero() {
            return Err(anyhow!("refresh.chart_interval_ms must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationConfig {
    /// Fixed seed for reproducible runs; entropy is used when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Offset applied when deriving the local hour for the diurnal curve.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl SimulationConfig {
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        offset_from_minutes(self.utc_offset_minutes)
    }

    pub fn validate(&self) -> Result<()> {
        self.utc_offset()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default = "default_max_progress_step")]
    pub max_progress_step: f64,
    #[serde(default)]
    pub completion: CompletionPolicy,
    #[serde(default = "default_fleet")]
    pub stations: Vec<ChargingStation>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_progress_step: default_max_progress_step(),
            completion: CompletionPolicy::default(),
            stations: default_fleet(),
        }
    }
}

impl FleetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_progress_step.is_nan() || self.max_progress_step <= 0.0 {
            return Err(anyhow!("fleet.max_progress_step must be greater than zero"));
        }
        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.id == 0 {
                return Err(anyhow!("station '{}' must have a positive id", station.name));
            }
            if !seen.insert(station.id) {
                return Err(anyhow!("duplicate station id {}", station.id));
            }
            if !(0.0..=100.0).contains(&station.progress_percent) {
                return Err(anyhow!(
                    "station {} progress {} is outside 0-100",
                    station.id,
                    station.progress_percent
                ));
            }
        }
        Ok(())
    }
}

/// Settings for the built-in geolocation provider.
///
/// Without coordinates the runtime behaves as if geolocation were
/// unsupported; `deny` simulates a rejected permission prompt.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub deny: bool,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn validate(&self) -> Result<()> {
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err(anyhow!(
                "location.latitude and location.longitude must be set together"
            ));
        }
        if let Some((lat, lng)) = self.coordinates() {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(anyhow!("location.latitude {} is outside -90..90", lat));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(anyhow!("location.longitude {} is outside -180..180", lng));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MapBackend {
    #[default]
    OpenStreetMap,
    Mapbox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub provider: MapBackend,
    #[serde(default)]
    pub mapbox_token: Option<String>,
    #[serde(default = "default_mapbox_style")]
    pub style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            provider: MapBackend::default(),
            mapbox_token: None,
            style: default_mapbox_style(),
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.provider == MapBackend::Mapbox
            && self
                .mapbox_token
                .as_deref()
                .map_or(true, |token| token.trim().is_empty())
        {
            return Err(anyhow!("map.provider = \"mapbox\" requires map.mapbox_token"));
        }
        Ok(())
    }
}
