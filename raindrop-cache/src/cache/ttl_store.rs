//! Time-bounded single-flight store for one entity kind.
//!
//! Reads take a lock-free fast path when a live entry exists. On a miss the
//! caller acquires the per-key gate, re-checks (another caller may have
//! filled the entry while it waited), and only then invokes the fetch. The
//! gate guard is released on every exit path, including cancellation and a
//! failed fetch, and the gate itself is dropped once no caller holds it.

use super::key::CacheKey;
use dashmap::DashMap;
use raindrop_core::{CacheableResponse, EntityKind, RaindropError, RaindropResult};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::traits::CacheStats;

/// Default lifetime of a cached entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Configuration for a cached store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry is served after it was stored.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Cached value with expiration time.
struct CachedEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CachedEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    populated: AtomicU64,
    skipped: AtomicU64,
    invalidations: AtomicU64,
}

/// Per-key TTL store with single-flight population.
///
/// One instance holds one entity kind. Keys partition it by user.
pub struct TtlCache<V> {
    kind: EntityKind,
    ttl: Duration,
    entries: DashMap<CacheKey, CachedEntry<V>>,
    gates: DashMap<CacheKey, Arc<Mutex<()>>>,
    counters: Counters,
}

impl<V: CacheableResponse> TtlCache<V> {
    pub fn new(kind: EntityKind, config: &CacheConfig) -> Self {
        Self {
            kind,
            ttl: config.ttl,
            entries: DashMap::new(),
            gates: DashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live entry for `key`, or fetch and (when cacheable) store it.
    ///
    /// At most one `fetch` runs per key at a time; callers arriving while it
    /// runs wait on the key's gate and are served the stored result. A
    /// response that is not cacheable, or a fetch error, is handed to the
    /// caller that invoked the fetch and nothing is stored, so the next
    /// waiter fetches again.
    ///
    /// Returns [`RaindropError::Cancelled`] if `cancel` fires before the gate
    /// is acquired or while the fetch is pending. The pending fetch future is
    /// dropped in that case.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<V>>,
    {
        if cancel.is_cancelled() {
            return Err(RaindropError::Cancelled);
        }

        if let Some(value) = self.live_copy(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(entity = %self.kind, key = %key.short(), "cache hit");
            return Ok(value);
        }

        let gate = self.gate(key);
        let result = self.fetch_under_gate(key, &gate, fetch, cancel).await;
        drop(gate);
        self.release_gate(key);
        result
    }

    async fn fetch_under_gate<F, Fut>(
        &self,
        key: &CacheKey,
        gate: &Mutex<()>,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<V>>,
    {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(entity = %self.kind, key = %key.short(), "cancelled waiting for cache gate");
                return Err(RaindropError::Cancelled);
            }
            guard = gate.lock() => guard,
        };

        if let Some(value) = self.live_copy(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(entity = %self.kind, key = %key.short(), "cache hit after wait");
            return Ok(value);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(entity = %self.kind, key = %key.short(), "cache miss, fetching");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(entity = %self.kind, key = %key.short(), "cancelled during fetch");
                return Err(RaindropError::Cancelled);
            }
            response = fetch() => response?,
        };

        if !response.is_cacheable() {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(entity = %self.kind, key = %key.short(), "response not cacheable");
            return Ok(response);
        }

        match Instant::now().checked_add(self.ttl) {
            Some(expires_at) => {
                self.entries.insert(
                    key.clone(),
                    CachedEntry {
                        value: response.clone(),
                        expires_at,
                    },
                );
                self.counters.populated.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    entity = %self.kind,
                    ttl_secs = self.ttl.as_secs(),
                    "cache ttl overflows the clock, response not stored"
                );
            }
        }

        Ok(response)
    }

    /// Live entry for `key` without fetching.
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        self.live_copy(key)
    }

    /// Remove the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(entity = %self.kind, key = %key.short(), "cache entry invalidated");
        }
        removed
    }

    /// Remove every entry for every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries and idle gates. Returns the number of entries removed.
    ///
    /// Gates are normally released when a read finishes; a read whose future
    /// is dropped mid-flight leaves its gate behind until this runs. Entries
    /// past their ttl are never served but stay resident until purged.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.is_live(now) {
                true
            } else {
                removed += 1;
                false
            }
        });
        // A gate with no outside holders and no entry is safe to recreate later.
        self.gates
            .retain(|key, gate| Arc::strong_count(gate) > 1 || self.entries.contains_key(key));

        removed
    }

    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            populated: self.counters.populated.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        }
    }

    fn live_copy(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Drop the gate for `key` once no caller holds it. Cloning out of the
    /// map and this check both take the shard lock, so a waiter never ends
    /// up on an orphaned gate.
    fn release_gate(&self, key: &CacheKey) {
        self.gates.remove_if(key, |_, gate| Arc::strong_count(gate) == 1);
    }

    fn gate(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        Arc::clone(
            self.gates
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use raindrop_core::{ItemsResponse, UpstreamError};

    fn key(raw: &str) -> CacheKey {
        CacheKey::derive(raw).unwrap()
    }

    fn store() -> TtlCache<ItemsResponse<u32>> {
        TtlCache::new(EntityKind::Collections, &CacheConfig::default())
    }

    #[test]
    fn test_config_defaults_to_five_minutes() {
        assert_eq!(CacheConfig::default().ttl, Duration::from_secs(300));
        let config = CacheConfig::new().with_ttl(Duration::from_secs(5));
        assert_eq!(config.ttl, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let store = store();
        let cancel = CancellationToken::new();
        let k = key("token");

        let first = store
            .get_or_fetch(&k, || async { Ok(ItemsResponse::ok(vec![1, 2])) }, &cancel)
            .await
            .unwrap();
        let second = store
            .get_or_fetch(&k, || async { Ok(ItemsResponse::ok(vec![9])) }, &cancel)
            .await
            .unwrap();

        assert_eq!(first.items(), &[1, 2]);
        assert_eq!(second.items(), &[1, 2]);
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.populated, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_propagated_and_not_stored() {
        let store = store();
        let cancel = CancellationToken::new();
        let k = key("token");

        let err = store
            .get_or_fetch(
                &k,
                || async {
                    Err(RaindropError::from(UpstreamError::Request {
                        endpoint: "/collections".to_string(),
                        reason: "connection reset".to_string(),
                    }))
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RaindropError::Upstream(_)));
        assert!(store.peek(&k).is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_response_is_returned_but_skipped() {
        let store = store();
        let cancel = CancellationToken::new();
        let k = key("token");

        let response = store
            .get_or_fetch(&k, || async { Ok(ItemsResponse::failed(vec![])) }, &cancel)
            .await
            .unwrap();

        assert!(!response.is_ok());
        assert!(store.peek(&k).is_none());
        assert_eq!(store.stats().skipped, 1);
    }

    #[tokio::test]
    async fn test_invalidate_reports_presence() {
        let store = store();
        let cancel = CancellationToken::new();
        let k = key("token");

        assert!(!store.invalidate(&k));
        store
            .get_or_fetch(&k, || async { Ok(ItemsResponse::ok(vec![1])) }, &cancel)
            .await
            .unwrap();
        assert!(store.invalidate(&k));
        assert!(store.peek(&k).is_none());
        assert_eq!(store.stats().invalidations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_removes_stale_entries() {
        let store = store();
        let cancel = CancellationToken::new();

        store
            .get_or_fetch(&key("a"), || async { Ok(ItemsResponse::ok(vec![1])) }, &cancel)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(200)).await;
        store
            .get_or_fetch(&key("b"), || async { Ok(ItemsResponse::ok(vec![2])) }, &cancel)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(150)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.peek(&key("b")).is_some());
    }

    #[tokio::test]
    async fn test_ttl_past_clock_range_is_not_stored() {
        let store: TtlCache<ItemsResponse<u32>> = TtlCache::new(
            EntityKind::Collections,
            &CacheConfig::new().with_ttl(Duration::MAX),
        );
        let cancel = CancellationToken::new();
        let k = key("token");

        let response = store
            .get_or_fetch(&k, || async { Ok(ItemsResponse::ok(vec![1])) }, &cancel)
            .await
            .unwrap();

        assert_eq!(response.items(), &[1]);
        assert!(store.is_empty());
        let stats = store.stats();
        assert_eq!(stats.populated, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_gates_are_released_after_each_read() {
        let store = store();
        let cancel = CancellationToken::new();

        for i in 0..5 {
            let raw = format!("token-{}", i);
            let _ = store
                .get_or_fetch(
                    &key(&raw),
                    || async {
                        Err(RaindropError::from(UpstreamError::Request {
                            endpoint: "/tags".to_string(),
                            reason: "timeout".to_string(),
                        }))
                    },
                    &cancel,
                )
                .await;
        }
        store
            .get_or_fetch(&key("skipped"), || async { Ok(ItemsResponse::failed(vec![])) }, &cancel)
            .await
            .unwrap();
        store
            .get_or_fetch(&key("stored"), || async { Ok(ItemsResponse::ok(vec![3])) }, &cancel)
            .await
            .unwrap();

        assert_eq!(store.gates.len(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_read_releases_gate() {
        let store = store();
        let cancel = CancellationToken::new();
        let k = key("token");
        let trigger = cancel.clone();

        let err = store
            .get_or_fetch(
                &k,
                move || async move {
                    trigger.cancel();
                    std::future::pending::<RaindropResult<ItemsResponse<u32>>>().await
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(store.gates.len(), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_fetch() {
        let store = store();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = store
            .get_or_fetch(&key("token"), || async { Ok(ItemsResponse::ok(vec![1])) }, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(store.stats().misses, 0);
    }
}
