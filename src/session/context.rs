//! Per-request named values that follow one async call chain.
//!
//! A [`RequestContext`] is installed with [`RequestContext::start`] around the
//! future that handles a request. Every step awaited inside that future sees
//! the same context through [`RequestContext::current`]; concurrently handled
//! requests each get their own instance. Tasks spawned with `tokio::spawn`
//! do not inherit the context.

use crate::session::scope::SessionScope;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Session state bound to one request
#[derive(Clone)]
pub struct ContextEntry {
    pub id: String,
    pub scope: Arc<dyn SessionScope>,
    pub cookie_written: bool,
}

/// Named-value storage scoped to one logical request
#[derive(Clone, Default)]
pub struct RequestContext {
    entries: Arc<Mutex<HashMap<String, ContextEntry>>>,
}

impl RequestContext {
    /// Run `entrypoint` inside a fresh context seeded with `initial_values`
    pub async fn start<F, I>(entrypoint: F, initial_values: I) -> F::Output
    where
        F: Future,
        I: IntoIterator<Item = (String, ContextEntry)>,
    {
        let context = Self::default();
        context.entries().extend(initial_values);
        REQUEST_CONTEXT.scope(context, entrypoint).await
    }

    /// The context of the request currently being handled, if any
    pub fn current() -> Option<Self> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }

    pub fn get(&self, name: &str) -> Option<ContextEntry> {
        self.entries().get(name).cloned()
    }

    /// Insert a value unless one is already bound; returns whether it was inserted
    pub fn set(&self, name: impl Into<String>, entry: ContextEntry) -> bool {
        let mut entries = self.entries();
        let name = name.into();
        if entries.contains_key(&name) {
            return false;
        }
        entries.insert(name, entry);
        true
    }

    /// Mutate a bound value in place while holding the context lock
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut ContextEntry) -> R) -> Option<R> {
        self.entries().get_mut(name).map(f)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ContextEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
