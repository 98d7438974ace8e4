//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./filesession.toml or ./.filesession/config.toml
//! 2. User config: ~/.filesession/config.toml
//! 3. System config: /etc/filesession/config.toml
//! 4. Built-in defaults

use crate::env;
use crate::session::{ConfigError, SessionConfig, SessionOptions};
use std::env as std_env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub name: Option<String>,
    pub directory: Option<String>,
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load options from the first config file in the hierarchy, or defaults
    pub fn discover_options() -> Result<SessionOptions, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return SessionOptions::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(SessionOptions::default())
    }

    /// Build the effective configuration from a file (explicit or
    /// discovered) plus command line overrides
    pub fn resolve(overrides: ConfigOverrides) -> Result<SessionConfig, ConfigError> {
        let mut options = match &overrides.config_file {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                SessionOptions::from_toml_file(path)?
            }
            None => Self::discover_options()?,
        };

        if let Some(name) = overrides.name {
            options.name = Some(name);
        }
        if let Some(directory) = overrides.directory {
            options.storage.directory = Some(directory);
        }
        if options.storage.directory.is_none() {
            options.storage.directory = Some(env::session::DEFAULT_DIRECTORY.to_string());
        }

        options.validate()
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = Self::get_config_candidates();

        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // 1. Current directory
        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        // 2. User config
        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        // 3. System config (Unix-like systems)
        #[cfg(unix)]
        candidates.push(Path::new("/etc/filesession").join(env::CONFIG_FILE_NAME));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("filesession")
                    .join(env::CONFIG_FILE_NAME),
            );
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        if let Some(found) = Self::find_config_file() {
            println!("Active configuration: {:?}", found);
        } else {
            println!("Active configuration: Built-in defaults");
        }
    }
}
