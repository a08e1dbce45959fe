//! Configuration management for unpage.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `unpage.toml` file
//! 3. Profile config `~/.config/unpage/profiles/<profile>/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Active profile. Selected at load time, never read from the file.
    #[serde(skip)]
    pub profile: String,

    /// Graph build and snapshot configuration.
    pub graph: GraphConfig,

    /// Plugin configuration.
    pub plugins: PluginsConfig,
}

impl Config {
    /// Load configuration for a profile from default locations.
    ///
    /// The profile falls back to `UNPAGE_PROFILE`, then to `default`.
    /// Searches for config in order:
    /// 1. `./unpage.toml` (project local)
    /// 2. `~/.config/unpage/profiles/<profile>/config.toml`
    /// 3. Falls back to defaults
    pub fn load(profile: Option<&str>) -> Result<Self, ConfigError> {
        let profile = profile
            .map(str::to_string)
            .or_else(|| std::env::var("UNPAGE_PROFILE").ok())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        if Path::new(LOCAL_CONFIG_FILE).exists() {
            return Self::from_file(LOCAL_CONFIG_FILE, &profile);
        }

        let profile_config = profile_root(&profile).join(PROFILE_CONFIG_FILE);
        if profile_config.exists() {
            return Self::from_file(&profile_config, &profile);
        }

        let mut config = Self {
            profile,
            ..Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>, profile: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.profile = profile.to_string();

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("UNPAGE_DATA_DIR") {
            self.graph.data_dir = Some(dir);
        }
        if let Ok(file) = std::env::var("UNPAGE_GRAPH_FILE") {
            self.graph.snapshot_file = file;
        }
        if let Ok(secs) = std::env::var("UNPAGE_BUILD_TIMEOUT_SECS") {
            if let Ok(n) = secs.parse() {
                self.graph.build_timeout_secs = Some(n);
            }
        }
    }

    /// Check values that would otherwise fail late, in the middle of a build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile.is_empty() {
            return Err(ConfigError::Invalid("profile name is empty".to_string()));
        }
        if self.profile.contains(|c| c == '/' || c == '\\') || self.profile == ".." {
            return Err(ConfigError::Invalid(format!(
                "profile name '{}' must not contain path separators",
                self.profile
            )));
        }
        if self.graph.build_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "graph.build_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.graph.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "graph.interval_secs must be greater than zero".to_string(),
            ));
        }

        let mut names = std::collections::HashSet::new();
        for source in &self.plugins.inventory {
            if source.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "inventory source name is empty".to_string(),
                ));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate inventory source '{}'",
                    source.name
                )));
            }
        }

        Ok(())
    }

    /// Directory holding this profile's snapshot, PID file and logs.
    pub fn profile_dir(&self) -> PathBuf {
        match &self.graph.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => profile_root(&self.profile),
        }
    }

    /// Full path to the graph snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.profile_dir().join(&self.graph.snapshot_file)
    }

    /// Full path to the build PID file.
    pub fn pid_path(&self) -> PathBuf {
        self.profile_dir().join(&self.graph.pid_file)
    }

    /// Full path to the background build log.
    pub fn log_path(&self) -> PathBuf {
        self.profile_dir().join(&self.graph.log_file)
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Root directory of a profile under the user config dir.
fn profile_root(profile: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(PROFILES_DIR)
        .join(profile)
}

/// Graph build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Overrides the profile directory (default: `~/.config/unpage/profiles/<profile>`).
    pub data_dir: Option<String>,

    /// Snapshot file name.
    pub snapshot_file: String,

    /// PID file name.
    pub pid_file: String,

    /// Background build log file name.
    pub log_file: String,

    /// Abort the build when populators run longer than this.
    pub build_timeout_secs: Option<u64>,

    /// Seconds between builds in interval mode.
    pub interval_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            pid_file: DEFAULT_PID_FILE.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            build_timeout_secs: None,
            interval_secs: DEFAULT_BUILD_INTERVAL_SECS,
        }
    }
}

impl GraphConfig {
    /// Global build timeout, if configured.
    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_secs.map(Duration::from_secs)
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Inventory directories, one populator each.
    pub inventory: Vec<InventorySource>,
}

/// A directory of exported resource inventories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySource {
    /// Plugin name shown in logs and build failures.
    pub name: String,

    /// Directory holding `.json` / `.yaml` inventory files.
    pub path: PathBuf,

    /// Disabled sources are skipped.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.graph.snapshot_file, DEFAULT_SNAPSHOT_FILE);
        assert_eq!(config.graph.interval_secs, DEFAULT_BUILD_INTERVAL_SECS);
        assert!(config.plugins.inventory.is_empty());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[graph]"));
        assert!(!toml_str.contains("profile"));
    }

    #[test]
    fn test_profile_paths() {
        let config = Config {
            profile: "prod".to_string(),
            graph: GraphConfig {
                data_dir: Some("/tmp/unpage-prod".to_string()),
                ..GraphConfig::default()
            },
            ..Config::default()
        };
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/unpage-prod/graph.json"));
        assert_eq!(config.pid_path(), PathBuf::from("/tmp/unpage-prod/graph_build.pid"));
    }

    #[test]
    fn test_validate_rejects_bad_profile() {
        let config = Config {
            profile: "../etc".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_sources() {
        let source = InventorySource {
            name: "gcp".to_string(),
            path: PathBuf::from("inv"),
            enabled: true,
        };
        let config = Config {
            profile: DEFAULT_PROFILE.to_string(),
            plugins: PluginsConfig {
                inventory: vec![source.clone(), source],
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
