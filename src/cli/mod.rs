use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod logging;
pub mod scenario;
pub mod version;

use config::{default_config_path, DepositFollowConfig};

#[derive(Parser)]
#[command(name = "deposit-follow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the asset-deposit follow module", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    InitConfig {
        /// Path to config file (default: ~/.local/share/deposit-follow/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run a scripted follow/unfollow scenario against in-memory collaborators
    Scenario {
        /// Scenario TOML file (runs the built-in scenario if not specified)
        #[arg(long)]
        file: Option<String>,

        /// Path to config file (defaults are used if it does not exist)
        #[arg(long)]
        config: Option<String>,

        /// Print the module event log as JSON lines after the run
        #[arg(long)]
        events: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::InitConfig { config, force } => init_config(config, force),
        Commands::Scenario {
            file,
            config,
            events,
        } => scenario::execute(config, file, events).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Write the commented default config.
fn init_config(config_path: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    DepositFollowConfig::create_default(&path)?;
    println!("📝 Created: {}", path.display());
    Ok(())
}

/// Load the config at `config_path` (or the default path), falling back to
/// defaults when no file exists, and install logging from it.
pub fn load_config(
    config_path: Option<String>,
) -> Result<DepositFollowConfig, Box<dyn std::error::Error>> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let config = if path.exists() {
        DepositFollowConfig::load(&path)?
    } else {
        let mut config = DepositFollowConfig::default();
        config.whitelist.assets = vec!["CUR".to_string()];
        config
    };

    logging::init_logging(&config.logging)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_scenario_defaults() {
        let cli = Cli::parse_from(["deposit-follow", "scenario"]);

        match cli.command {
            Commands::Scenario {
                file,
                config,
                events,
            } => {
                assert_eq!(file, None);
                assert_eq!(config, None);
                assert!(!events);
            }
            _ => panic!("Expected Scenario command"),
        }
    }

    #[test]
    fn test_cli_parse_scenario_with_options() {
        let cli = Cli::parse_from([
            "deposit-follow",
            "scenario",
            "--file",
            "/tmp/follow.toml",
            "--config",
            "/etc/deposit-follow/config.toml",
            "--events",
        ]);

        match cli.command {
            Commands::Scenario {
                file,
                config,
                events,
            } => {
                assert_eq!(file, Some("/tmp/follow.toml".to_string()));
                assert_eq!(config, Some("/etc/deposit-follow/config.toml".to_string()));
                assert!(events);
            }
            _ => panic!("Expected Scenario command"),
        }
    }

    #[test]
    fn test_cli_parse_init_config() {
        let cli = Cli::parse_from(["deposit-follow", "init-config", "--force"]);

        match cli.command {
            Commands::InitConfig { config, force } => {
                assert_eq!(config, None);
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["deposit-follow", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let path_str = path.to_string_lossy().to_string();

        init_config(Some(path_str.clone()), false).unwrap();
        assert!(init_config(Some(path_str.clone()), false).is_err());
        init_config(Some(path_str), true).unwrap();
    }
}
