//! Deposit Follow configuration file handling
//!
//! Provides default configuration generation and loading for the CLI.
//! Configuration files are TOML format and live under the platform data dir.
//!
//! ## Operator vs Profile Configuration
//!
//! This file holds OPERATOR settings only: which account the module escrows
//! into, which assets the whitelist accepts, and logging.
//!
//! Per-profile deposit requirements are NOT here. Each profile owner sets
//! them when attaching the module.

use deposit_follow::assets::{AccountId, Amount, AssetId, StaticWhitelist};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default escrow account of the module
const DEFAULT_ESCROW_ACCOUNT: &str = "deposit-follow-escrow";

/// CLI configuration (OPERATOR settings only)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DepositFollowConfig {
    /// Follow module settings
    #[serde(default)]
    pub module: ModuleConfig,

    /// Whitelist gate settings
    #[serde(default)]
    pub whitelist: WhitelistConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Follow module settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Ledger account the module escrows deposits into
    #[serde(default = "default_escrow_account")]
    pub escrow_account: String,
}

/// Whitelist gate settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WhitelistConfig {
    /// Assets accepted as deposits
    #[serde(default)]
    pub assets: Vec<String>,

    /// Largest single deposit accepted (optional, unlimited if not specified)
    ///
    /// TOML integers are 64-bit; larger caps are not expressible here.
    pub max_amount: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_escrow_account() -> String {
    DEFAULT_ESCROW_ACCOUNT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            escrow_account: default_escrow_account(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl DepositFollowConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: DepositFollowConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    pub fn escrow_account(&self) -> AccountId {
        AccountId::new(self.module.escrow_account.clone())
    }

    /// Build the whitelist gate these settings describe.
    pub fn whitelist_gate(&self) -> StaticWhitelist {
        let gate = StaticWhitelist::new(self.whitelist.assets.iter().map(AssetId::new));
        match self.whitelist.max_amount {
            Some(max) => gate.with_max_amount(Amount::from(max)),
            None => gate,
        }
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# Deposit Follow Configuration (Operator Settings)
#
# Per-profile deposit requirements are NOT configured here. Each profile
# owner sets them when attaching the follow module to their profile.

[module]
# Ledger account the module escrows deposits into
escrow_account = "{escrow}"

[whitelist]
# Assets accepted as follow deposits
assets = ["CUR"]

# Largest single deposit accepted (optional, unlimited if not specified)
# max_amount = 1000000

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/deposit-follow/deposit-follow.log"
"#,
            escrow = DEFAULT_ESCROW_ACCOUNT,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, Self::generate_default_toml()).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// - Linux: ~/.local/share/deposit-follow/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deposit-follow")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DepositFollowConfig::default();

        assert_eq!(config.module.escrow_account, DEFAULT_ESCROW_ACCOUNT);
        assert!(config.whitelist.assets.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = DepositFollowConfig::default();
        config.whitelist.assets = vec!["CUR".to_string(), "DAI".to_string()];
        config.whitelist.max_amount = Some(500);
        config.save(&config_path).unwrap();

        let loaded = DepositFollowConfig::load(&config_path).unwrap();
        assert_eq!(loaded.whitelist.assets, vec!["CUR", "DAI"]);
        assert_eq!(loaded.whitelist.max_amount, Some(500));
    }

    #[test]
    fn test_create_default_config_loads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        DepositFollowConfig::create_default(&config_path).unwrap();
        let config = DepositFollowConfig::load(&config_path).unwrap();

        assert_eq!(config.whitelist.assets, vec!["CUR"]);
        assert_eq!(config.whitelist.max_amount, None);
        assert_eq!(config.escrow_account(), AccountId::new(DEFAULT_ESCROW_ACCOUNT));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let minimal_config = r#"
[whitelist]
assets = ["CUR"]
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = DepositFollowConfig::load(&config_path).unwrap();

        assert_eq!(config.module.escrow_account, DEFAULT_ESCROW_ACCOUNT);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = DepositFollowConfig::load(&temp_dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("deposit-follow/config.toml"));
    }
}
