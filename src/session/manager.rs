use crate::env;
use crate::session::cache::{MemoryCache, ObjectCache, RecordCache};
use crate::session::config::SessionConfig;
use crate::session::context::{ContextEntry, RequestContext};
use crate::session::cookie;
use crate::session::error::SessionError;
use crate::session::identifier;
use crate::session::persistence::{FileSessionStore, SessionStore};
use crate::session::record::SessionRecord;
use crate::session::scope::SessionScope;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Central session manager for one named session domain (e.g. `"user"`).
///
/// `start` binds an identifier to the current request; `get`, `set`,
/// `remove` and `destroy` then operate on that request's session from any
/// step awaited inside the `start` continuation.
pub struct SessionManager {
    config: Arc<SessionConfig>,
    context_key: String,
    records: RecordCache,
}

impl SessionManager {
    /// Create a manager persisting to the configured directory with an
    /// unbounded in-memory cache
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let store = Arc::new(FileSessionStore::from_config(&config)?);
        Ok(Self::with_parts(config, store, Arc::new(MemoryCache::new())))
    }

    /// Create a manager over a custom store and object cache
    pub fn with_parts(
        config: SessionConfig,
        store: Arc<dyn SessionStore>,
        objects: Arc<dyn ObjectCache<SessionRecord>>,
    ) -> Self {
        info!(
            "Session manager initialized: {} ({})",
            config.name, config.storage.directory
        );

        Self {
            context_key: format!("{}{}_id", env::session::CONTEXT_KEY_PREFIX, config.name),
            config: Arc::new(config),
            records: RecordCache::new(objects, store),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bind a session identifier to the request carried by `scope` and run
    /// the rest of the request inside that binding.
    ///
    /// The identifier comes from the scope's literal id, else from the
    /// session cookie, else it is freshly generated. A fresh identifier is
    /// written back to the client on the first `set`.
    pub async fn start<F>(&self, scope: Arc<dyn SessionScope>, on_ready: F) -> F::Output
    where
        F: Future,
    {
        let (id, pre_existing) = self.resolve_identifier(scope.as_ref());
        debug!(
            "Session {} started ({})",
            self.config.name,
            if pre_existing { "existing" } else { "new" }
        );

        let entry = ContextEntry {
            id,
            scope,
            cookie_written: pre_existing,
        };

        match RequestContext::current() {
            Some(context) => {
                if !context.set(self.context_key.clone(), entry) {
                    debug!(
                        "Session {} already started for this request, keeping identifier",
                        self.config.name
                    );
                }
                on_ready.await
            }
            None => RequestContext::start(on_ready, [(self.context_key.clone(), entry)]).await,
        }
    }

    /// Identifier bound to the current request, if started
    pub fn id(&self) -> Option<String> {
        self.bound_entry().map(|(_, entry)| entry.id)
    }

    /// Value stored under `key`, or `default` when absent or not started
    pub async fn get(&self, key: &str, default: Value) -> Value {
        let Some((_, entry)) = self.bound_entry() else {
            return default;
        };

        let record = self.records.resolve(&entry.id).await;
        record.get(key).cloned().unwrap_or(default)
    }

    /// Typed variant of [`get`](Self::get)
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.get(key, Value::Null).await {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Store `value` under `key` and persist the whole record.
    ///
    /// Writes the session cookie first if this request has not written it
    /// yet. Fails with [`SessionError::NotStarted`] outside a started request
    /// and with [`SessionError::Io`] when the record could not be persisted.
    pub async fn set<V: Serialize>(&self, key: &str, value: V) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let (context, entry) = self.started_entry()?;
        self.write_cookie_once(&context, &entry);

        let key = key.to_string();
        self.records
            .update(&entry.id, move |record| {
                record.insert(key, value);
            })
            .await
    }

    /// Delete `key` from the session and persist the record
    pub async fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let (context, entry) = self.started_entry()?;
        self.write_cookie_once(&context, &entry);

        self.records
            .update(&entry.id, |record| record.remove(key))
            .await
    }

    /// Clear the cookie, delete the persisted record and evict it from the
    /// cache. Does nothing when the request has no session.
    pub async fn destroy(&self) {
        let Some((_, entry)) = self.bound_entry() else {
            return;
        };

        entry
            .scope
            .set_cookie(cookie::build_expired_cookie(&self.config));
        self.records.evict(&entry.id).await;
        info!("Session {} destroyed", self.config.name);
    }

    fn resolve_identifier(&self, scope: &dyn SessionScope) -> (String, bool) {
        let supplied = scope.session_id().map(str::to_owned).or_else(|| {
            scope
                .cookie_header()
                .and_then(|header| cookie::extract(header, self.config.cookie_name()))
        });

        match supplied {
            Some(id) if identifier::is_valid(&id) => (id, true),
            Some(id) => {
                warn!(
                    "Ignoring malformed {} session identifier ({} bytes)",
                    self.config.name,
                    id.len()
                );
                (identifier::generate(self.config.id_length), false)
            }
            None => (identifier::generate(self.config.id_length), false),
        }
    }

    fn bound_entry(&self) -> Option<(RequestContext, ContextEntry)> {
        let context = RequestContext::current()?;
        let entry = context.get(&self.context_key)?;
        Some((context, entry))
    }

    fn started_entry(&self) -> Result<(RequestContext, ContextEntry), SessionError> {
        self.bound_entry().ok_or_else(|| SessionError::NotStarted {
            name: self.config.name.clone(),
        })
    }

    /// Emit the session cookie unless this request already did
    fn write_cookie_once(&self, context: &RequestContext, entry: &ContextEntry) {
        let first = context
            .update(&self.context_key, |e| {
                !std::mem::replace(&mut e.cookie_written, true)
            })
            .unwrap_or(false);

        if first {
            entry
                .scope
                .set_cookie(cookie::build_set_cookie(&entry.id, &self.config, Utc::now()));
            debug!("Session cookie written for {}", self.config.name);
        }
    }
}
