use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BioSyncError;
use crate::history::MAX_HISTORY_CAPACITY;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Simulation model and clock settings
    pub simulation: SimulationSettings,

    /// Protection windows granted by completed recommendations
    pub cooldowns: CooldownDurations,

    /// Minimum spacing between repeated advisories
    pub retrigger: RetriggerWindows,

    /// Logging configuration
    pub logging: LogConfig,
}

/// Simulation model and clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Damping constant `k` applied to the heart rate climb
    /// (target = baseline + t * multiplier * k)
    pub hr_damping: f64,

    /// Fraction of the gap to the target heart rate closed per tick
    pub hr_smoothing: f64,

    /// Number of snapshots kept in the history buffer
    pub history_capacity: usize,

    /// Wall-clock length of one tick in milliseconds
    pub tick_interval_ms: u64,

    /// Allow switching exercise type while a session is running
    pub allow_exercise_change_while_running: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            hr_damping: 0.3,
            hr_smoothing: 0.1,
            history_capacity: 60,
            tick_interval_ms: 1000,
            allow_exercise_change_while_running: false,
        }
    }
}

/// Cooldown lengths in ticks, per remedial action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownDurations {
    pub hydration: u32,
    pub energy: u32,
    pub temperature: u32,
}

impl Default for CooldownDurations {
    fn default() -> Self {
        Self {
            hydration: 45,
            energy: 60,
            temperature: 30,
        }
    }
}

/// Re-trigger windows in seconds, per advisory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetriggerWindows {
    pub hydration: u64,
    pub energy: u64,
    pub temperature: u64,
}

impl Default for RetriggerWindows {
    fn default() -> Self {
        Self {
            hydration: 60,
            energy: 90,
            temperature: 120,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Write the default configuration unless a file already exists
    ///
    /// Returns whether a file was written.
    pub fn init_file<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!(path = %path.display(), "Config file already present");
            return Ok(false);
        }

        Self::default().save_to_file(path)?;
        tracing::info!(path = %path.display(), "Default config written");
        Ok(true)
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("biosync")
            .join("config.toml")
    }

    /// Load an explicit file, or the default location with fallback to defaults
    ///
    /// An explicitly named file must exist and parse; a missing default file
    /// silently yields the built-in configuration.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let config_path = Self::default_config_path();
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_file(&config_path)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        let sim = &self.simulation;

        if !(sim.hr_damping.is_finite() && sim.hr_damping > 0.0) {
            return Err(BioSyncError::Configuration(format!(
                "simulation.hr_damping must be positive, got {}",
                sim.hr_damping
            )));
        }

        if !(sim.hr_smoothing > 0.0 && sim.hr_smoothing <= 1.0) {
            return Err(BioSyncError::Configuration(format!(
                "simulation.hr_smoothing must be in (0, 1], got {}",
                sim.hr_smoothing
            )));
        }

        if sim.history_capacity == 0 || sim.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(BioSyncError::Configuration(format!(
                "simulation.history_capacity must be between 1 and {}, got {}",
                MAX_HISTORY_CAPACITY, sim.history_capacity
            )));
        }

        if sim.tick_interval_ms == 0 {
            return Err(BioSyncError::Configuration(
                "simulation.tick_interval_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
