//! Request carriers passed to `SessionManager::start`.

use std::sync::{Mutex, PoisonError};

/// The request/response (or test) carrier a session is started with.
///
/// A scope supplies the inbound identifier, either literally or through a
/// `Cookie` header, and optionally accepts outbound `Set-Cookie` values.
/// Scopes without a response carrier keep the default no-op `set_cookie`.
pub trait SessionScope: Send + Sync {
    /// Identifier supplied directly by the carrier, bypassing cookies
    fn session_id(&self) -> Option<&str> {
        None
    }

    /// Raw `Cookie` request header
    fn cookie_header(&self) -> Option<&str> {
        None
    }

    /// Append a `Set-Cookie` response header value
    fn set_cookie(&self, _header_value: String) {}
}

/// HTTP request/response pair reduced to what sessions need
#[derive(Debug, Default)]
pub struct HttpScope {
    cookie_header: Option<String>,
    set_cookies: Mutex<Vec<String>>,
}

impl HttpScope {
    pub fn new(cookie_header: Option<String>) -> Self {
        Self {
            cookie_header,
            set_cookies: Mutex::new(Vec::new()),
        }
    }

    /// Scope for a request that carries no cookies
    pub fn without_cookies() -> Self {
        Self::new(None)
    }

    /// Scope for a request carrying the given `Cookie` header
    pub fn with_cookie_header(header: impl Into<String>) -> Self {
        Self::new(Some(header.into()))
    }

    /// `Set-Cookie` values written so far, in order
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.set_cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionScope for HttpScope {
    fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    fn set_cookie(&self, header_value: String) {
        self.set_cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(header_value);
    }
}

/// Carrier that names the session directly and has no response
#[derive(Debug, Clone)]
pub struct IdScope {
    id: String,
}

impl IdScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl SessionScope for IdScope {
    fn session_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}
