//! Session configuration: raw options and their validated form.
//!
//! [`SessionOptions`] mirrors what a user writes (every field optional,
//! camelCase aliases accepted). [`SessionOptions::validate`] applies defaults
//! and normalization and yields the immutable [`SessionConfig`] the manager
//! consumes.

use crate::env;
use crate::session::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User-facing session options, typically loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "maxAge", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(alias = "idLength", skip_serializing_if = "Option::is_none")]
    pub id_length: Option<usize>,
    pub storage: StorageOptions,
    pub cookie: CookieOptions,
}

/// Where records are persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Cookie overrides; unset fields fall back to session-level values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(alias = "httpOnly", skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(alias = "maxAge", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

/// Validated, immutable configuration of one session domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub name: String,
    pub max_age: u64,
    pub id_length: usize,
    pub storage: StorageConfig,
    pub cookie: CookieConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageConfig {
    /// Always ends with a path separator
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookieConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub http_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    pub path: String,
    pub secure: bool,
}

impl SessionOptions {
    /// Options with only the storage directory set
    pub fn with_directory(directory: impl Into<String>) -> Self {
        Self {
            storage: StorageOptions {
                directory: Some(directory.into()),
            },
            ..Default::default()
        }
    }

    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load options from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply defaults, normalize, and check every field
    pub fn validate(self) -> Result<SessionConfig, ConfigError> {
        let name = self
            .name
            .unwrap_or_else(|| env::session::DEFAULT_NAME.to_string());
        if !is_cookie_token(&name) {
            return Err(ConfigError::InvalidName(name));
        }

        if let Some(cookie_name) = &self.cookie.name
            && !is_cookie_token(cookie_name)
        {
            return Err(ConfigError::InvalidCookieName(cookie_name.clone()));
        }

        let id_length = self.id_length.unwrap_or(env::session::DEFAULT_ID_LENGTH);
        if id_length == 0 || id_length > env::session::MAX_ID_LENGTH {
            return Err(ConfigError::InvalidIdLength {
                value: id_length,
                max: env::session::MAX_ID_LENGTH,
            });
        }

        let directory = match self.storage.directory {
            Some(dir) if !dir.trim().is_empty() => normalize_directory(dir),
            _ => return Err(ConfigError::MissingDirectory),
        };

        Ok(SessionConfig {
            name,
            max_age: self.max_age.unwrap_or(env::session::DEFAULT_MAX_AGE_SECS),
            id_length,
            storage: StorageConfig { directory },
            cookie: CookieConfig {
                name: self.cookie.name,
                domain: self.cookie.domain.filter(|d| !d.is_empty()),
                http_only: self.cookie.http_only.unwrap_or(false),
                max_age: self.cookie.max_age,
                path: self
                    .cookie
                    .path
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| env::cookie::DEFAULT_PATH.to_string()),
                secure: self.cookie.secure.unwrap_or(false),
            },
        })
    }
}

impl SessionConfig {
    /// Validate `options` under the given session name
    pub fn new(name: impl Into<String>, options: SessionOptions) -> Result<Self, ConfigError> {
        SessionOptions {
            name: Some(name.into()),
            ..options
        }
        .validate()
    }

    /// Cookie name: `cookie.name`, else the session name
    pub fn cookie_name(&self) -> &str {
        self.cookie.name.as_deref().unwrap_or(&self.name)
    }

    /// Cookie lifetime in seconds: `cookie.max_age`, else `max_age`
    pub fn cookie_max_age(&self) -> u64 {
        self.cookie.max_age.unwrap_or(self.max_age)
    }

    /// Serialize the effective configuration for display
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

pub(crate) fn normalize_directory(mut dir: String) -> String {
    if !dir.ends_with('/') && !dir.ends_with(std::path::MAIN_SEPARATOR) {
        dir.push(std::path::MAIN_SEPARATOR);
    }
    dir
}

/// RFC 6265 cookie-name token check
fn is_cookie_token(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={}";
    !name.is_empty()
        && name
            .bytes()
            .all(|b| (0x21..0x7f).contains(&b) && !SEPARATORS.contains(&b))
}
