//! In-memory cache of analysis results keyed by normalized address.
//!
//! Entries live for a fixed TTL. Expiry is lazy: a read that finds an
//! expired entry removes it and reports a miss. [`ResultCache::purge_expired`]
//! sweeps everything at once.
//!
//! The cache has no capacity bound. Growth is limited only by the number of
//! distinct addresses analyzed within one TTL window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::AnalysisResult;

/// Default lifetime for cached analyses (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Cached analysis with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<AnalysisResult>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide result cache shared across concurrent requests.
#[derive(Debug)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry, deleting it if it has expired.
    pub async fn get(&self, key: &str) -> Option<Arc<AnalysisResult>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // Another writer may have refreshed the entry between the two locks.
        if let Some(entry) = entries.get(key)
            && !entry.is_expired(Instant::now())
        {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        tracing::debug!("cache entry expired for {}", key);
        None
    }

    /// Insert or overwrite the entry for `key`, expiring one TTL from now.
    pub async fn set(&self, key: impl Into<String>, value: Arc<AnalysisResult>) {
        let entry = CacheEntry { value, expires_at: Instant::now() + self.ttl };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Whether an entry is physically stored, expired or not.
    pub async fn contains_raw(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove every expired entry, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}
