//! Default values for unpage configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Profile Defaults
// ============================================================================

/// Profile used when none is given on the command line or in the environment.
pub const DEFAULT_PROFILE: &str = "default";

/// Application directory name under the user config dir.
pub const APP_DIR_NAME: &str = "unpage";

/// Subdirectory holding one directory per profile.
pub const PROFILES_DIR: &str = "profiles";

/// Per-profile config file name.
pub const PROFILE_CONFIG_FILE: &str = "config.toml";

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "unpage.toml";

// ============================================================================
// Graph Defaults
// ============================================================================

/// Snapshot file written after every successful build.
pub const DEFAULT_SNAPSHOT_FILE: &str = "graph.json";

/// PID file guarding against concurrent builds of the same profile.
pub const DEFAULT_PID_FILE: &str = "graph_build.pid";

/// Log file used by background builds.
pub const DEFAULT_LOG_FILE: &str = "graph_build.log";

/// Seconds between builds when `--interval` is given without a value.
pub const DEFAULT_BUILD_INTERVAL_SECS: u64 = 3600;

// ============================================================================
// Inventory Defaults
// ============================================================================

/// File extensions the inventory plugin reads.
pub const INVENTORY_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];
