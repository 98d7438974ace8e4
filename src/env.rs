//! Environment constants and path utilities for filesession.
//!
//! This module centralizes the defaults, file names and wire constants used
//! throughout the crate, making them easier to maintain and modify.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".filesession";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name when placed directly in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "filesession.toml";

/// Session-related defaults
pub mod session {
    /// Default session lifetime in seconds (30 days)
    pub const DEFAULT_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

    /// Default identifier length in characters
    pub const DEFAULT_ID_LENGTH: usize = 32;

    /// Longest identifier accepted from a client or configuration
    pub const MAX_ID_LENGTH: usize = 128;

    /// Session name used when none is configured
    pub const DEFAULT_NAME: &str = "session";

    /// Directory used by the CLI when none is configured
    pub const DEFAULT_DIRECTORY: &str = "./sessions/";

    /// Extension of persisted session records
    pub const RECORD_EXTENSION: &str = "json";

    /// Prefix of the per-manager key inside a request context
    pub const CONTEXT_KEY_PREFIX: &str = "session_";
}

/// Cookie wire constants
pub mod cookie {
    /// Default cookie path
    pub const DEFAULT_PATH: &str = "/";

    /// HTTP-date format (RFC 7231 IMF-fixdate)
    pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

    /// Expires value used to clear a cookie
    pub const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";
}

/// Test-related constants
pub mod test {
    /// Session name used by tests
    pub const TEST_SESSION_NAME: &str = "user";

    /// Literal identifier used by tests
    pub const TEST_SESSION_ID: &str = "test-session";
}

/// Build the application directory path from a base directory
pub fn app_dir_path(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
}

/// Build the config path inside a local `.filesession` directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    app_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the user config path (`~/.filesession/config.toml`)
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the path of a persisted record from a normalized directory
///
/// The directory is expected to end with a path separator.
pub fn record_file_path(directory: &str, id: &str) -> PathBuf {
    PathBuf::from(format!("{directory}{id}.{}", session::RECORD_EXTENSION))
}
