//! Cache layer
//!
//! In-memory caching for the live feed and other hot read paths, built on
//! moka's async cache. Values are stored as JSON strings so any serializable
//! type fits, and keys can be invalidated in bulk with glob-style patterns
//! (the feed uses `feed:*`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
///
/// Generic methods keep this out of trait-object territory; share the
/// concrete `MemoryCache` via `Arc` instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration)
        -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Cache entry wrapper that stores serialized JSON data
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
///
/// Entries expire after the cache-wide TTL. Per-call TTLs shorter than the
/// configured one are not enforced.
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with the given capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .support_invalidation_closures()
            .build();

        Self { cache, default_ttl }
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Check if a pattern matches a key using glob-style matching
    ///
    /// `*` matches any sequence of characters, `?` matches a single one.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                if Self::glob_match(pattern, key, pi + 1, ki) {
                    return true;
                }
                ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1)
            }
            '?' => ki < key.len() && Self::glob_match(pattern, key, pi + 1, ki + 1),
            p => ki < key.len() && key[ki] == p && Self::glob_match(pattern, key, pi + 1, ki + 1),
        }
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        // Expiration follows the cache-wide time_to_live
        let _ = ttl;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Walks all keys, fine at the capacities we run with
        let keys_to_delete: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

/// Create a cache instance based on configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.capacity, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> MemoryCache {
        MemoryCache::with_capacity_and_ttl(1000, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = test_cache();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = test_cache();

        let result: Option<String> = cache.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = test_cache();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("key1").await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = test_cache();
        let ttl = Duration::from_secs(60);

        cache.set("feed:de:1", &"a".to_string(), ttl).await.unwrap();
        cache.set("feed:de:2", &"b".to_string(), ttl).await.unwrap();
        cache.set("regions:all", &"c".to_string(), ttl).await.unwrap();

        cache.delete_pattern("feed:*").await.unwrap();

        let feed1: Option<String> = cache.get("feed:de:1").await.unwrap();
        let feed2: Option<String> = cache.get("feed:de:2").await.unwrap();
        let regions: Option<String> = cache.get("regions:all").await.unwrap();

        assert_eq!(feed1, None);
        assert_eq!(feed2, None);
        assert_eq!(regions, Some("c".to_string()));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = test_cache();
        let ttl = Duration::from_secs(60);

        cache.set("key1", &"value1".to_string(), ttl).await.unwrap();
        cache.set("key2", &"value2".to_string(), ttl).await.unwrap();

        cache.clear().await.unwrap();

        let result1: Option<String> = cache.get("key1").await.unwrap();
        let result2: Option<String> = cache.get("key2").await.unwrap();

        assert_eq!(result1, None);
        assert_eq!(result2, None);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let ttl = Duration::from_millis(10);
        let cache = MemoryCache::with_capacity_and_ttl(1000, ttl);

        cache.set("key", &"value".to_string(), ttl).await.unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cache.run_pending_tasks().await;

        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_complex_types() {
        let cache = test_cache();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Entry {
            id: i64,
            text: String,
        }

        let entry = Entry {
            id: 1,
            text: "Should e-scooters be banned?".to_string(),
        };

        cache
            .set("item:1", &entry, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<Entry> = cache.get("item:1").await.unwrap();
        assert_eq!(result, Some(entry));
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("feed:*", "feed:de:SWIPE"));
        assert!(MemoryCache::pattern_matches("feed:*", "feed:"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
        assert!(!MemoryCache::pattern_matches("feed:*", "regions:all"));

        assert!(MemoryCache::pattern_matches("item:?", "item:1"));
        assert!(!MemoryCache::pattern_matches("item:?", "item:10"));

        assert!(MemoryCache::pattern_matches("exact", "exact"));
        assert!(!MemoryCache::pattern_matches("exact", "exactx"));
    }

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        cache
            .set("key", &"value".to_string(), cache.default_ttl())
            .await
            .unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }
}
