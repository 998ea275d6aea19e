//! Raindrop Cache - Response Cache and Bulk Writes
//!
//! Per-credential response caching with single-flight fetches, explicit
//! invalidation after writes, and a chunked pipeline for bulk mutations.

pub mod bulk;
pub mod cache;

pub use bulk::{BulkWriteOutcome, BulkWritePipeline, DEFAULT_CHUNK_SIZE};
pub use cache::{
    CacheConfig, CacheInvalidator, CacheKey, CacheStats, CachedEntity, KeyDeriver,
    ResponseCache, Sha256KeyDeriver, TtlCache, DEFAULT_TTL,
};

// Callers hand cancellation tokens straight to the cache and pipeline.
pub use tokio_util::sync::CancellationToken;
