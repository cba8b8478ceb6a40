//! Configuration system for the custom role runtime
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (CUSTOM_ROLES_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::roles::{DuplicatePolicy, HookPolicy, ManagerSettings};
use crate::scheduler::SchedulerConfig;

/// Accepted range for `simulation.speed`
pub const SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.01..=1000.0;

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Regeneration scheduler timing
    pub scheduler: SchedulerSettings,

    /// Registry behaviour
    pub registry: RegistrySettings,

    /// Infinite effect maintenance
    pub effects: EffectSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Simulated round driven by `custom-role-host run`
    pub simulation: SimulationSettings,
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Outer role tick period in milliseconds
    pub tick_interval_ms: u64,

    /// Shield regeneration step period in milliseconds
    pub regen_interval_ms: u64,

    /// How per-tick hook results combine: all-approve or false-seeded
    pub hook_policy: HookPolicy,
}

/// Registry settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Second summon for the same player: replace, reject or allow
    pub duplicate_policy: DuplicatePolicy,
}

/// Effect maintenance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Infinite effect sweep period in milliseconds
    pub sweep_interval_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// Simulated round settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Role catalogue file (None = bundled catalogue)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalogue: Option<String>,

    /// Number of simulated players
    pub players: u32,

    /// Round length in simulated seconds
    pub duration_secs: u64,

    /// Simulated seconds per wall-clock second
    pub speed: f64,

    /// Milliseconds between simulated damage events
    pub damage_every_ms: u64,

    /// Damage dealt per event
    pub damage_amount: f32,

    /// Milliseconds between simulated effect expiries
    pub expire_every_ms: u64,
}

// Default implementations

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            regen_interval_ms: 1000,
            hook_policy: HookPolicy::AllApprove,
        }
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            catalogue: None,
            players: 8,
            duration_secs: 30,
            speed: 1.0,
            damage_every_ms: 3000,
            damage_amount: 20.0,
            expire_every_ms: 5000,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("custom-roles.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("custom-roles").join("runtime.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".custom-roles").join("runtime.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Scheduler settings
        if let Ok(val) = std::env::var("CUSTOM_ROLES_TICK_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.scheduler.tick_interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("CUSTOM_ROLES_REGEN_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.scheduler.regen_interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("CUSTOM_ROLES_HOOK_POLICY") {
            if let Some(policy) = HookPolicy::from_str(&val) {
                self.scheduler.hook_policy = policy;
            }
        }

        // Registry settings
        if let Ok(val) = std::env::var("CUSTOM_ROLES_DUPLICATE_POLICY") {
            match val.to_lowercase().as_str() {
                "replace" => self.registry.duplicate_policy = DuplicatePolicy::Replace,
                "reject" => self.registry.duplicate_policy = DuplicatePolicy::Reject,
                "allow" => self.registry.duplicate_policy = DuplicatePolicy::Allow,
                _ => {}
            }
        }

        // Effect settings
        if let Ok(val) = std::env::var("CUSTOM_ROLES_SWEEP_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.effects.sweep_interval_ms = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("CUSTOM_ROLES_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("CUSTOM_ROLES_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("CUSTOM_ROLES_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }

        // Simulation settings
        if let Ok(val) = std::env::var("CUSTOM_ROLES_CATALOGUE") {
            self.simulation.catalogue = Some(val);
        }
        if let Ok(val) = std::env::var("CUSTOM_ROLES_PLAYERS") {
            if let Ok(n) = val.parse() {
                self.simulation.players = n;
            }
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
        if let Some(ref catalogue) = self.simulation.catalogue {
            self.simulation.catalogue = Some(expand_path(catalogue));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(Error::config_field_invalid(
                "scheduler.tick_interval_ms",
                "tick_interval_ms must be greater than 0",
            ));
        }

        if self.scheduler.regen_interval_ms == 0 {
            return Err(Error::config_field_invalid(
                "scheduler.regen_interval_ms",
                "regen_interval_ms must be greater than 0",
            ));
        }

        if self.effects.sweep_interval_ms == 0 {
            return Err(Error::config_field_invalid(
                "effects.sweep_interval_ms",
                "sweep_interval_ms must be greater than 0",
            ));
        }

        if !SPEED_RANGE.contains(&self.simulation.speed) {
            return Err(Error::config_field_invalid(
                "simulation.speed",
                format!(
                    "speed must be between {} and {}",
                    SPEED_RANGE.start(),
                    SPEED_RANGE.end()
                ),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Scheduler configuration derived from the settings
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: chrono::Duration::milliseconds(self.scheduler.tick_interval_ms as i64),
            regen_interval: chrono::Duration::milliseconds(self.scheduler.regen_interval_ms as i64),
            hook_policy: self.scheduler.hook_policy,
        }
    }

    /// Lifecycle manager settings derived from the configuration
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            scheduler: self.scheduler_config(),
            duplicate_policy: self.registry.duplicate_policy,
        }
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".custom-roles")
                .join("runtime.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# Custom Role Runtime Configuration

[scheduler]
# Outer role tick period in milliseconds
tick_interval_ms = 250

# Shield regeneration step period in milliseconds
regen_interval_ms = 1000

# How per-tick hook results combine: "all-approve" or "false-seeded"
hook_policy = "all-approve"

[registry]
# Second summon for a player holding a role: "replace", "reject" or "allow"
duplicate_policy = "replace"

[effects]
# Infinite effect sweep period in milliseconds
sweep_interval_ms = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.custom-roles/logs/runtime.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false

[simulation]
# Role catalogue (comment out to use the bundled catalogue)
# catalogue = "~/.custom-roles/roles.toml"

# Number of simulated players
players = 8

# Round length in simulated seconds
duration_secs = 30

# Simulated seconds per wall-clock second
speed = 1.0

# Milliseconds between simulated damage events
damage_every_ms = 3000

# Damage dealt per event
damage_amount = 20.0

# Milliseconds between simulated effect expiries
expire_every_ms = 5000
"#
    .to_string()
}
