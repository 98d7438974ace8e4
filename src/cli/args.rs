//! Command line argument parsing
//!
//! Subcommands operate on one session directory:
//! - `generate`: Print a fresh session identifier
//! - `list`: List persisted session identifiers
//! - `show`: Print a whole session record
//! - `get` / `set`: Read or write one key
//! - `destroy`: Delete a session
//! - `cookie`: Print the Set-Cookie header for an identifier
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "filesession")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and administer a file-backed session directory")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Session directory (overrides storage.directory)
    #[arg(short = 'd', long = "directory", global = true)]
    pub directory: Option<String>,
    /// Session name (overrides name)
    #[arg(short = 'n', long = "name", global = true)]
    pub name: Option<String>,
    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a freshly generated session identifier
    Generate {
        /// Identifier length (defaults to id_length)
        #[arg(short = 'l', long = "length")]
        length: Option<usize>,
    },
    /// List persisted session identifiers
    List,
    /// Print a session record as JSON
    Show {
        /// Session identifier
        id: String,
    },
    /// Print one value of a session
    Get {
        /// Session identifier
        id: String,
        /// Key to read
        key: String,
    },
    /// Set one value of a session (JSON, or a plain string)
    Set {
        /// Session identifier
        id: String,
        /// Key to write
        key: String,
        /// Value to store
        value: String,
    },
    /// Delete a session
    Destroy {
        /// Session identifier
        id: String,
    },
    /// Print the Set-Cookie header value binding an identifier
    Cookie {
        /// Session identifier
        id: String,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

/// Interpret a command line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
