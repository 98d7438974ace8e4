//! # filesession
//!
//! File-backed, cookie-addressed sessions for async HTTP request pipelines.
//!
//! Each visitor gets an opaque identifier carried in a cookie; the identifier
//! names a JSON record on disk. Records are loaded lazily into a process-wide
//! cache exactly once and every mutation rewrites the whole record, with
//! loads and saves for one identifier serialized so concurrent requests never
//! lose each other's updates.
//!
//! ## Architecture Overview
//!
//! - **[`session::identifier`]**: random 62-symbol session identifiers
//! - **[`session::cookie`]**: `Cookie` parsing and `Set-Cookie` serialization
//! - **[`session::persistence`]**: the [`SessionStore`] trait and its
//!   one-file-per-session implementation
//! - **[`session::cache`]**: the pluggable [`ObjectCache`] and the
//!   single-flight [`RecordCache`] on top of it
//! - **[`session::context`]**: task-local per-request state
//! - **[`session::manager`]**: the [`SessionManager`] tying it all together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filesession::{HttpScope, SessionConfig, SessionManager, SessionOptions};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::new("user", SessionOptions::with_directory("./sessions"))?;
//!     let sessions = SessionManager::new(config)?;
//!
//!     // One inbound request
//!     let scope = Arc::new(HttpScope::with_cookie_header("user=abc123"));
//!     sessions
//!         .start(scope.clone(), async {
//!             let visits = sessions.get("visits", json!(0)).await.as_i64().unwrap_or(0);
//!             sessions.set("visits", visits + 1).await
//!         })
//!         .await?;
//!
//!     for header in scope.set_cookie_headers() {
//!         println!("Set-Cookie: {header}");
//!     }
//!     Ok(())
//! }
//! ```

/// Session identity, caching and persistence.
///
/// Everything needed to bind a request to a session and read or write its
/// record lives here.
pub mod session;

/// Environment constants and path utilities.
///
/// Centralizes defaults, file names and wire constants used throughout the
/// crate.
pub mod env;

/// Command-line administration of a session directory.
pub mod cli;

// Re-export main session types
pub use session::{
    ConfigError, CookieOptions, FileSessionStore, HttpScope, IdScope, MemoryCache, ObjectCache,
    RecordCache, RequestContext, SessionConfig, SessionError, SessionManager, SessionOptions,
    SessionRecord, SessionScope, SessionStore, StorageOptions,
};
