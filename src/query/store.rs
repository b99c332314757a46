//! Query cache the manager sweeps
//!
//! The application's query cache is an external collaborator; the manager
//! only needs to enumerate entries and remove them one at a time.
//! [`InMemoryQueryCache`] is the in-process implementation.

use crate::error::Result;
use crate::query::types::QueryInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Contract the cache manager needs from a query cache
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Metadata for every entry, in no particular order
    async fn entries(&self) -> Result<Vec<QueryInfo>>;

    /// Remove one entry; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

struct CachedQuery {
    data: Value,
    info: QueryInfo,
}

/// In-memory query cache keyed by string
///
/// Entries carry a stale time and an observer count, mirroring what a client
/// query library tracks per query.
pub struct InMemoryQueryCache {
    default_stale_time: Duration,
    queries: RwLock<HashMap<String, CachedQuery>>,
}

impl InMemoryQueryCache {
    pub fn new(default_stale_time: Duration) -> Self {
        info!("Initializing query cache (stale time: {:?})", default_stale_time);
        Self {
            default_stale_time,
            queries: RwLock::new(HashMap::new()),
        }
    }

    /// Store data under `key`, stamped now
    pub async fn insert(&self, key: impl Into<String>, data: Value) {
        self.insert_at(key, data, Utc::now()).await;
    }

    /// Store data with an explicit write time
    pub async fn insert_at(&self, key: impl Into<String>, data: Value, updated_at: DateTime<Utc>) {
        let key = key.into();
        let size_bytes = key.len() + data.to_string().len();
        let mut queries = self.queries.write().await;

        // Replacing data keeps the subscribers
        let observers = queries.get(&key).map(|q| q.info.observers).unwrap_or(0);

        debug!("Caching query: {}", key);
        queries.insert(
            key.clone(),
            CachedQuery {
                data,
                info: QueryInfo {
                    key,
                    updated_at,
                    stale_time: self.default_stale_time,
                    observers,
                    size_bytes,
                },
            },
        );
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.queries.read().await.get(key).map(|q| q.data.clone())
    }

    /// Set the number of subscribers for `key`; returns false if absent
    pub async fn set_observers(&self, key: &str, observers: usize) -> bool {
        match self.queries.write().await.get_mut(key) {
            Some(query) => {
                query.info.observers = observers;
                true
            }
            None => false,
        }
    }

    /// Override the stale time for one entry; returns false if absent
    pub async fn set_stale_time(&self, key: &str, stale_time: Duration) -> bool {
        match self.queries.write().await.get_mut(key) {
            Some(query) => {
                query.info.stale_time = stale_time;
                true
            }
            None => false,
        }
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.queries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.queries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut queries = self.queries.write().await;
        let count = queries.len();
        queries.clear();
        info!("Cleared {} queries from cache", count);
    }
}

#[async_trait]
impl QueryCache for InMemoryQueryCache {
    async fn entries(&self) -> Result<Vec<QueryInfo>> {
        Ok(self.queries.read().await.values().map(|q| q.info.clone()).collect())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.queries.write().await.remove(key).is_some() {
            debug!("Removed query: {}", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = InMemoryQueryCache::new(Duration::from_secs(60));
        cache.insert("vehicle:ABC123", json!({"make": "Volvo"})).await;

        assert_eq!(cache.get("vehicle:ABC123").await, Some(json!({"make": "Volvo"})));
        assert_eq!(cache.len().await, 1);

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries[0].key, "vehicle:ABC123");
        assert_eq!(entries[0].stale_time, Duration::from_secs(60));
        assert!(entries[0].size_bytes > 0);
    }

    #[tokio::test]
    async fn test_replace_keeps_observers() {
        let cache = InMemoryQueryCache::new(Duration::from_secs(60));
        cache.insert("user:me", json!(1)).await;
        assert!(cache.set_observers("user:me", 2).await);

        cache.insert("user:me", json!(2)).await;
        let entries = cache.entries().await.unwrap();
        assert_eq!(entries[0].observers, 2);
        assert!(!cache.set_observers("missing", 1).await);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = InMemoryQueryCache::new(Duration::from_secs(60));
        cache.insert("a", json!(null)).await;
        cache.insert("b", json!(null)).await;

        cache.remove("a").await.unwrap();
        cache.remove("a").await.unwrap();
        assert!(!cache.contains_key("a").await);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
