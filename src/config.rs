//! Configuration for the notification engine and its CLI.
//!
//! Settings are layered:
//! - Default values
//! - TOML configuration file (`.adaptable/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the commands)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ADAPTABLE_` and use double
//! underscores to separate nested levels:
//! - `ADAPTABLE_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `ADAPTABLE_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file.
pub const CONFIG_DIR: &str = ".adaptable";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "ADAPTABLE_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Artifact-level watching of real directories
    #[serde(default)]
    pub watch: WatchConfig,

    /// Which artifact containers start a new interpreted root
    #[serde(default)]
    pub structure: StructureConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every module without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `adaptable_notify::interpreted = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// How long a path must be quiet before its change is delivered
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often the dispatcher checks for quiet paths
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StructureConfig {
    /// Glob patterns matched against container names
    #[serde(default = "default_root_patterns")]
    pub root_patterns: Vec<String>,

    /// Absolute artifact paths that are always roots
    #[serde(default)]
    pub root_paths: Vec<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_debounce_ms() -> u64 {
    200
}
fn default_tick_ms() -> u64 {
    50
}
fn default_root_patterns() -> Vec<String> {
    ["*.ear", "*.war", "*.jar", "*.rar"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            logging: LoggingConfig::default(),
            watch: WatchConfig::default(),
            structure: StructureConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            root_patterns: default_root_patterns(),
            root_paths: Vec::new(),
        }
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory
    /// from the current directory up to the file-system root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = Path::new(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
