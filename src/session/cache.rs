//! Shared in-memory record cache with per-identifier serialization.
//!
//! [`ObjectCache`] is the pluggable key/value map (eviction policy is up to
//! the implementation). [`RecordCache`] layers cache-aside loading on top of
//! it: a miss loads from the [`SessionStore`] and populates the cache. Loads
//! and load-mutate-save sequences for the same identifier run one at a time
//! behind a per-identifier async mutex, so concurrent requests share one
//! load and never overwrite each other's saves.

use crate::session::error::SessionError;
use crate::session::persistence::SessionStore;
use crate::session::record::SessionRecord;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// In-memory key/value map shared by every request
pub trait ObjectCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: &str, value: V);
    fn delete(&self, key: &str);
}

/// Unbounded cache backed by a concurrent hash map
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: DashMap<String, V>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> ObjectCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Cache-aside record access with single-flight per identifier
pub struct RecordCache {
    objects: Arc<dyn ObjectCache<SessionRecord>>,
    store: Arc<dyn SessionStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Claim on a per-identifier lock, held while waiting and while locked.
///
/// Dropping it (acquired or still queued) removes the map entry once no
/// other claim remains.
struct IdLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    id: &'a str,
    mutex: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.mutex.take();
        self.locks
            .remove_if(self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl RecordCache {
    pub fn new(objects: Arc<dyn ObjectCache<SessionRecord>>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            objects,
            store,
            locks: DashMap::new(),
        }
    }

    /// Return the cached record, loading it from the store on a miss
    pub async fn resolve(&self, id: &str) -> SessionRecord {
        if let Some(record) = self.objects.get(id) {
            return record;
        }

        let _lock = self.lock(id).await;
        self.resolve_locked(id).await
    }

    /// Load, mutate and persist a record as one serialized step.
    ///
    /// The cache keeps the mutation even when the save fails.
    pub async fn update<F, R>(&self, id: &str, mutate: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut SessionRecord) -> R,
    {
        let _lock = self.lock(id).await;

        let mut record = self.resolve_locked(id).await;
        let output = mutate(&mut record);
        self.objects.set(id, record.clone());
        self.store.save(&record).await?;

        Ok(output)
    }

    /// Delete the persisted record and drop it from the cache
    pub async fn evict(&self, id: &str) {
        let _lock = self.lock(id).await;

        self.store.remove(id).await;
        self.objects.delete(id);
        debug!("Evicted session {}", id);
    }

    /// Number of identifiers with a held or awaited lock
    pub(crate) fn pending(&self) -> usize {
        self.locks.len()
    }

    async fn resolve_locked(&self, id: &str) -> SessionRecord {
        // Another task may have loaded it while we waited
        if let Some(record) = self.objects.get(id) {
            return record;
        }

        let record = self.store.load(id).await;
        self.objects.set(id, record.clone());
        record
    }

    async fn lock<'a>(&'a self, id: &'a str) -> IdLock<'a> {
        let mut lock = IdLock {
            locks: &self.locks,
            id,
            mutex: Some(self.locks.entry(id.to_string()).or_default().value().clone()),
            guard: None,
        };

        if let Some(mutex) = &lock.mutex {
            lock.guard = Some(Arc::clone(mutex).lock_owned().await);
        }
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory store that counts loads and yields during I/O
    #[derive(Default)]
    struct CountingStore {
        records: DashMap<String, SessionRecord>,
        loads: AtomicUsize,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for CountingStore {
        async fn load(&self, id: &str) -> SessionRecord {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.records
                .get(id)
                .map(|r| r.value().clone())
                .unwrap_or_else(|| SessionRecord::new(id))
        }

        async fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.records.insert(record.id().to_string(), record.clone());
            Ok(())
        }

        async fn remove(&self, id: &str) {
            self.records.remove(id);
        }
    }

    fn create_cache() -> (Arc<CountingStore>, Arc<MemoryCache<SessionRecord>>, RecordCache) {
        let store = Arc::new(CountingStore::default());
        let objects = Arc::new(MemoryCache::new());
        let cache = RecordCache::new(objects.clone(), store.clone());
        (store, objects, cache)
    }

    #[test]
    fn test_memory_cache_operations() {
        let cache: MemoryCache<u32> = MemoryCache::new();
        assert!(cache.is_empty());

        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);

        cache.delete("a");
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test]
    async fn test_resolve_loads_once() {
        let (store, objects, cache) = create_cache();

        let first = cache.resolve("abc").await;
        let second = cache.resolve("abc").await;

        assert_eq!(first, second);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert!(objects.get("abc").is_some());
        assert_eq!(cache.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_resolve_is_single_flight() {
        let (store, _objects, cache) = create_cache();

        let resolves = (0..10).map(|_| cache.resolve("abc"));
        futures::future::join_all(resolves).await;

        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let (store, _objects, cache) = create_cache();

        let updates = (0..5).map(|i| {
            let cache = &cache;
            async move {
                cache
                    .update("abc", |record| {
                        record.insert(format!("key{i}"), json!(i));
                    })
                    .await
            }
        });
        for result in futures::future::join_all(updates).await {
            result.unwrap();
        }

        let persisted = store.records.get("abc").unwrap().value().clone();
        assert_eq!(persisted.len(), 5);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_miss_after_external_eviction_reloads() {
        let (store, objects, cache) = create_cache();
        cache
            .update("abc", |record| {
                record.insert("k", json!("v"));
            })
            .await
            .unwrap();

        objects.delete("abc");

        let record = cache.resolve("abc").await;
        assert_eq!(record.get("k"), Some(&json!("v")));
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_lock_entry() {
        let (store, _objects, cache) = create_cache();

        let mut holder = Box::pin(cache.update("abc", |record| {
            record.insert("k", json!(1));
        }));
        let mut waiter = Box::pin(cache.update("abc", |record| {
            record.insert("k", json!(2));
        }));

        // holder takes the lock and parks in load; waiter queues behind it
        assert!(futures::poll!(holder.as_mut()).is_pending());
        assert!(futures::poll!(waiter.as_mut()).is_pending());
        assert_eq!(cache.pending(), 1);

        holder.await.unwrap();
        assert_eq!(cache.pending(), 1);

        drop(waiter);
        assert_eq!(cache.pending(), 0);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timed_out_update_releases_lock_entry() {
        let (_store, _objects, cache) = create_cache();

        let mut holder = Box::pin(cache.update("abc", |record| {
            record.insert("k", json!(1));
        }));
        assert!(futures::poll!(holder.as_mut()).is_pending());

        let timed_out = tokio::time::timeout(
            Duration::from_millis(1),
            cache.update("abc", |record| {
                record.insert("k", json!(2));
            }),
        )
        .await;
        assert!(timed_out.is_err());

        holder.await.unwrap();
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.resolve("abc").await.get("k"), Some(&json!(1)));
        assert_eq!(cache.pending(), 0);
    }

    #[tokio::test]
    async fn test_evict_clears_store_and_cache() {
        let (store, objects, cache) = create_cache();
        cache
            .update("abc", |record| {
                record.insert("k", json!(1));
            })
            .await
            .unwrap();

        cache.evict("abc").await;

        assert!(objects.get("abc").is_none());
        assert!(store.records.get("abc").is_none());
        assert!(cache.resolve("abc").await.is_empty());
    }
}
