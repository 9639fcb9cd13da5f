//! Result cache.
//!
//! Maps a normalized URL to its last verdict. Concurrent writers for the same
//! key are allowed; the last write wins.

mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

pub use sqlite::SqliteScanCache;

use crate::models::ScanResult;

/// Key-value store of verdicts keyed by URL.
#[async_trait]
pub trait ScanCache: Send + Sync {
    /// Returns the stored verdict for `url`, if any.
    async fn get(&self, url: &str) -> Result<Option<ScanResult>>;

    /// Stores `result` under `result.url`, replacing any previous entry.
    async fn put(&self, result: &ScanResult) -> Result<()>;
}

/// Process-local cache. Entries live until the process exits.
#[derive(Debug, Default, Clone)]
pub struct MemoryScanCache {
    entries: Arc<DashMap<String, ScanResult>>,
}

impl MemoryScanCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached URLs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ScanCache for MemoryScanCache {
    async fn get(&self, url: &str) -> Result<Option<ScanResult>> {
        Ok(self.entries.get(url).map(|entry| entry.value().clone()))
    }

    async fn put(&self, result: &ScanResult) -> Result<()> {
        self.entries.insert(result.url.clone(), result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = MemoryScanCache::new();
        assert!(cache.get("http://example.com").await.unwrap().is_none());

        let result = ScanResult::new("http://example.com", Classification::Safe, "URL appears safe");
        cache.put(&result).await.unwrap();
        assert_eq!(cache.get("http://example.com").await.unwrap(), Some(result));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_cache_last_write_wins() {
        let cache = MemoryScanCache::new();
        cache
            .put(&ScanResult::new("http://a.test", Classification::Safe, "first"))
            .await
            .unwrap();
        cache
            .put(&ScanResult::new("http://a.test", Classification::Malicious, "second"))
            .await
            .unwrap();
        let stored = cache.get("http://a.test").await.unwrap().unwrap();
        assert_eq!(stored.classification, Classification::Malicious);
        assert_eq!(stored.reason, "second");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_cache_concurrent_writers() {
        let cache = MemoryScanCache::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .put(&ScanResult::new(
                        "http://race.test",
                        Classification::Suspicious,
                        format!("writer {i}"),
                    ))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let stored = cache.get("http://race.test").await.unwrap().unwrap();
        assert_eq!(stored.classification, Classification::Suspicious);
        assert!(stored.reason.starts_with("writer "));
    }
}
