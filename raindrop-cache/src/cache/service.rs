//! The per-user response cache used by the tool layer.

use super::key::{CacheKey, KeyDeriver, Sha256KeyDeriver};
use super::traits::{CacheInvalidator, CacheStats, CachedEntity};
use super::ttl_store::{CacheConfig, TtlCache};
use raindrop_core::{
    CacheError, Collection, EntityKind, ItemResponse, ItemsResponse, RaindropResult, TagInfo,
    UserInfo,
};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cached reads of the collection list, the tag list, and the user profile,
/// partitioned by credential.
///
/// Intended to be shared for the whole process behind an `Arc`. Each entity
/// kind has its own store and its own gates, so a slow profile fetch never
/// blocks a collection read.
///
/// Expired entries are not evicted on their own. A long-running owner should
/// call [`ResponseCache::purge_expired`] periodically to bound memory.
pub struct ResponseCache {
    deriver: Arc<dyn KeyDeriver>,
    collections: TtlCache<ItemsResponse<Collection>>,
    tags: TtlCache<ItemsResponse<TagInfo>>,
    user: TtlCache<ItemResponse<UserInfo>>,
}

impl ResponseCache {
    /// Create a cache keyed by SHA-256 of the credential.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_deriver(config, Arc::new(Sha256KeyDeriver))
    }

    pub fn with_deriver(config: CacheConfig, deriver: Arc<dyn KeyDeriver>) -> Self {
        Self {
            deriver,
            collections: TtlCache::new(EntityKind::Collections, &config),
            tags: TtlCache::new(EntityKind::Tags, &config),
            user: TtlCache::new(EntityKind::User, &config),
        }
    }

    pub fn derive_key(&self, raw_credential: &str) -> Result<CacheKey, CacheError> {
        self.deriver.derive(raw_credential)
    }

    /// Cached read for any entity kind with a store in this cache.
    ///
    /// Fails with [`CacheError::InvalidCredential`] before calling `fetch`
    /// when the credential is empty.
    pub async fn get_or_fetch<V, F, Fut>(
        &self,
        raw_credential: &str,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<V>
    where
        V: CachedEntity,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<V>>,
    {
        let key = self.derive_key(raw_credential)?;
        V::store(self).get_or_fetch(&key, fetch, cancel).await
    }

    pub async fn collections<F, Fut>(
        &self,
        raw_credential: &str,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Collection>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<ItemsResponse<Collection>>>,
    {
        self.get_or_fetch(raw_credential, fetch, cancel).await
    }

    pub async fn tags<F, Fut>(
        &self,
        raw_credential: &str,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<TagInfo>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<ItemsResponse<TagInfo>>>,
    {
        self.get_or_fetch(raw_credential, fetch, cancel).await
    }

    pub async fn user_info<F, Fut>(
        &self,
        raw_credential: &str,
        fetch: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<UserInfo>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RaindropResult<ItemResponse<UserInfo>>>,
    {
        self.get_or_fetch(raw_credential, fetch, cancel).await
    }

    pub fn stats(&self, kind: EntityKind) -> CacheStats {
        match kind {
            EntityKind::Collections => self.collections.stats(),
            EntityKind::Tags => self.tags.stats(),
            EntityKind::User => self.user.stats(),
        }
    }

    /// Drop expired entries across every store. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.collections.purge_expired() + self.tags.purge_expired() + self.user.purge_expired()
    }

    fn invalidate_partition(&self, kind: EntityKind, key: &CacheKey) -> bool {
        match kind {
            EntityKind::Collections => self.collections.invalidate(key),
            EntityKind::Tags => self.tags.invalidate(key),
            EntityKind::User => self.user.invalidate(key),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheInvalidator for ResponseCache {
    fn invalidate_entity_type(&self, kind: EntityKind, raw_credential: &str) {
        let Ok(key) = self.derive_key(raw_credential) else {
            tracing::debug!(entity = %kind, "invalidation skipped, empty credential");
            return;
        };
        self.invalidate_partition(kind, &key);
    }

    fn invalidate_all(&self, raw_credential: &str) {
        let Ok(key) = self.derive_key(raw_credential) else {
            tracing::debug!("invalidation skipped, empty credential");
            return;
        };
        for kind in EntityKind::ALL {
            self.invalidate_partition(kind, &key);
        }
        tracing::debug!(key = %key.short(), "all cached entity kinds invalidated");
    }
}

impl CachedEntity for ItemsResponse<Collection> {
    const KIND: EntityKind = EntityKind::Collections;

    fn store(cache: &ResponseCache) -> &TtlCache<Self> {
        &cache.collections
    }
}

impl CachedEntity for ItemsResponse<TagInfo> {
    const KIND: EntityKind = EntityKind::Tags;

    fn store(cache: &ResponseCache) -> &TtlCache<Self> {
        &cache.tags
    }
}

impl CachedEntity for ItemResponse<UserInfo> {
    const KIND: EntityKind = EntityKind::User;

    fn store(cache: &ResponseCache) -> &TtlCache<Self> {
        &cache.user
    }
}
