//! CLI-specific functionality for filesession
//!
//! This module contains all CLI-related code including argument parsing,
//! configuration discovery, and subcommand execution.

pub mod args;
pub mod commands;
pub mod config;

pub use args::{Args, Commands, parse_value};
pub use commands::execute;
pub use config::{ConfigDiscovery, ConfigOverrides};
