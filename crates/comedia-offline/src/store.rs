//! Named cache stores keyed by request identity.
//!
//! [`MemoryCacheStorage`] keeps one moka cache per store name. Hosts with a
//! real persistent cache API implement [`CacheStorage`] over it instead.

use crate::error::CacheError;
use crate::request::{RequestKey, Response};
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::Arc;

/// One named store of request → last-known-good response
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name (the cache version)
    fn name(&self) -> &str;

    /// Stored response for `key`
    async fn lookup(&self, key: &RequestKey) -> Option<Response>;

    /// Store `response` under `key`, replacing any previous entry
    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError>;

    /// Store several entries
    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), CacheError> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    /// Keys currently stored
    async fn keys(&self) -> Vec<RequestKey>;
}

/// Set of named stores
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (creating if needed) the store called `name`
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, CacheError>;

    /// Names of every existing store
    async fn names(&self) -> Vec<String>;

    /// Delete a store; `false` if it did not exist
    async fn delete(&self, name: &str) -> bool;

    /// Whether a store exists
    async fn has(&self, name: &str) -> bool {
        self.names().await.iter().any(|n| n == name)
    }

    /// First stored response for `key` across all stores
    async fn match_any(&self, key: &RequestKey) -> Option<Response> {
        for name in self.names().await {
            if let Ok(store) = self.open(&name).await {
                if let Some(response) = store.lookup(key).await {
                    return Some(response);
                }
            }
        }
        None
    }
}

#[async_trait]
impl<S: CacheStorage + ?Sized> CacheStorage for Arc<S> {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, CacheError> {
        (**self).open(name).await
    }

    async fn names(&self) -> Vec<String> {
        (**self).names().await
    }

    async fn delete(&self, name: &str) -> bool {
        (**self).delete(name).await
    }

    async fn has(&self, name: &str) -> bool {
        (**self).has(name).await
    }

    async fn match_any(&self, key: &RequestKey) -> Option<Response> {
        (**self).match_any(key).await
    }
}

/// In-process store backed by moka
///
/// Stores are unbounded: an entry only leaves when it is overwritten or its
/// whole store is deleted on activation.
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    name: String,
    inner: Cache<RequestKey, Response>,
}

impl MemoryCacheStore {
    /// Empty store called `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Cache::builder().build(),
        }
    }

    /// Exact entry count
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        self.inner.get(key).await
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError> {
        self.inner.insert(key, response).await;
        Ok(())
    }

    async fn keys(&self) -> Vec<RequestKey> {
        let mut keys: Vec<_> = self.inner.iter().map(|(k, _)| (*k).clone()).collect();
        keys.sort();
        keys
    }
}

/// In-process [`CacheStorage`]
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    stores: Arc<DashMap<String, Arc<MemoryCacheStore>>>,
}

impl MemoryCacheStorage {
    /// Storage with no stores
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle to a store, if it exists
    #[must_use]
    pub fn store(&self, name: &str) -> Option<Arc<MemoryCacheStore>> {
        self.stores.get(name).map(|s| Arc::clone(s.value()))
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, CacheError> {
        let store: Arc<dyn CacheStore> = self
            .stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCacheStore::new(name)))
            .clone();
        Ok(store)
    }

    async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.stores.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    async fn delete(&self, name: &str) -> bool {
        self.stores.remove(name).is_some()
    }

    async fn has(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        let url = Url::parse("http://localhost:5000").unwrap().join(path).unwrap();
        RequestKey::from(&url)
    }

    #[tokio::test]
    async fn put_overwrites_previous_entry() {
        let storage = MemoryCacheStorage::default();
        let store = storage.open("v1").await.unwrap();

        store.put(key("/a"), Response::ok("old")).await.unwrap();
        store.put(key("/a"), Response::ok("new")).await.unwrap();

        assert_eq!(store.lookup(&key("/a")).await.unwrap().body, "new");
        assert_eq!(storage.store("v1").unwrap().entry_count().await, 1);
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let storage = MemoryCacheStorage::default();
        let first = storage.open("v1").await.unwrap();
        first.put(key("/a"), Response::ok("x")).await.unwrap();

        let second = storage.open("v1").await.unwrap();
        assert!(second.lookup(&key("/a")).await.is_some());
        assert_eq!(storage.names().await, vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_store_and_entries() {
        let storage = MemoryCacheStorage::default();
        let store = storage.open("v0").await.unwrap();
        store.put(key("/a"), Response::ok("x")).await.unwrap();

        assert!(storage.delete("v0").await);
        assert!(!storage.delete("v0").await);
        assert!(!storage.has("v0").await);
        assert!(storage.match_any(&key("/a")).await.is_none());
    }

    #[tokio::test]
    async fn match_any_searches_every_store() {
        let storage = MemoryCacheStorage::default();
        storage.open("v0").await.unwrap();
        let v1 = storage.open("v1").await.unwrap();
        v1.put(key("/b"), Response::ok("b")).await.unwrap();

        assert_eq!(storage.match_any(&key("/b")).await.unwrap().body, "b");
    }

    #[tokio::test]
    async fn keys_are_sorted() {
        let storage = MemoryCacheStorage::default();
        let store = storage.open("v1").await.unwrap();
        store.put(key("/b"), Response::ok("")).await.unwrap();
        store.put(key("/a"), Response::ok("")).await.unwrap();

        assert_eq!(store.keys().await, vec![key("/a"), key("/b")]);
    }

    #[tokio::test]
    async fn stores_do_not_evict() {
        let storage = MemoryCacheStorage::new();
        let store = storage.open("v1").await.unwrap();
        for i in 0..12_000 {
            store
                .put(key(&format!("/item/{i}")), Response::ok("x"))
                .await
                .unwrap();
        }
        store.put(key("/"), Response::ok("<html>")).await.unwrap();

        assert_eq!(storage.store("v1").unwrap().entry_count().await, 12_001);
        assert_eq!(store.lookup(&key("/")).await.unwrap().body, "<html>");
    }
}
