//! Invalidation and cacheable-response traits.

use super::service::ResponseCache;
use super::ttl_store::TtlCache;
use raindrop_core::{CacheableResponse, EntityKind};

/// Removes cached entries after writes.
///
/// Both operations are idempotent and never fail. An empty or otherwise
/// unusable credential has nothing to invalidate and is a no-op.
pub trait CacheInvalidator: Send + Sync {
    /// Drop the entry for one entity kind within the caller's partition.
    fn invalidate_entity_type(&self, kind: EntityKind, raw_credential: &str);

    /// Drop every entity kind within the caller's partition.
    fn invalidate_all(&self, raw_credential: &str);
}

/// A response type with a dedicated store inside [`ResponseCache`].
///
/// Implemented for the collection list, the tag list, and the user profile.
pub trait CachedEntity: CacheableResponse + Sized {
    /// The entity kind this response is invalidated under.
    const KIND: EntityKind;

    /// The store holding responses of this type.
    fn store(cache: &ResponseCache) -> &TtlCache<Self>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a live entry, including callers that waited on
    /// another caller's fetch.
    pub hits: u64,
    /// Reads that had to invoke the fetch.
    pub misses: u64,
    /// Fetch results stored for reuse.
    pub populated: u64,
    /// Fetch results handed back without being stored.
    pub skipped: u64,
    /// Entries removed by invalidation.
    pub invalidations: u64,
    /// Number of entries currently held, including expired ones not yet purged.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
