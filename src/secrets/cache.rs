//! In-memory TTL cache for fetched secrets.
//!
//! Expiry is checked lazily on read: an entry whose deadline has passed is
//! treated as absent even if no sweep has removed it yet. Entries are only
//! ever replaced whole, so concurrent writers for the same name leave the
//! cache valid and the last writer wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::types::SecretString;

/// Default TTL for cached secrets (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: SecretString,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Shared secret cache. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct SecretCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `name` if present and not expired.
    pub async fn get(&self, name: &str) -> Option<SecretString> {
        let cache = self.inner.read().await;
        let entry = cache.get(name)?;

        if entry.is_live(Instant::now()) {
            debug!(secret = %name, "Cache hit for secret");
            Some(entry.value.clone())
        } else {
            debug!(secret = %name, "Cached secret expired");
            None
        }
    }

    /// Store or overwrite `name`, expiring `ttl` from now.
    pub async fn put(&self, name: &str, value: SecretString, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        let mut cache = self.inner.write().await;
        cache.insert(name.to_string(), CacheEntry { value, expires_at });
        debug!(secret = %name, ttl_ms = ttl.as_millis() as u64, "Cached secret");
    }

    /// Drop a single entry.
    pub async fn invalidate(&self, name: &str) {
        let mut cache = self.inner.write().await;
        if cache.remove(name).is_some() {
            debug!(secret = %name, "Invalidated cached secret");
        }
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        let mut cache = self.inner.write().await;
        let count = cache.len();
        cache.clear();
        debug!(count = count, "Cleared secret cache");
    }

    /// Physically remove expired entries. Reads never depend on this.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.inner.write().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.is_live(now));
        before - cache.len()
    }

    /// Number of physical entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
