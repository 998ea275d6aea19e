//! Response cache with per-credential isolation and single-flight fetches.
//!
//! Every read goes through [`TtlCache::get_or_fetch`], which returns a live
//! cached copy without locking, or takes the partition's gate, re-checks, and
//! invokes the supplied fetch at most once per cold partition no matter how
//! many callers are waiting.
//!
//! # Credential Isolation
//!
//! Partitions are keyed by [`CacheKey`], a one-way digest of the caller's
//! credential. A `CacheKey` cannot be built from an arbitrary string, so no
//! map in this module can ever be indexed by raw secret material.
//!
//! # Copies
//!
//! Values go in and come out by `Clone`. A caller mutating what it received
//! cannot affect the stored value or what any other caller sees.
//!
//! # Example
//!
//! ```ignore
//! let cache = ResponseCache::new(CacheConfig::default());
//!
//! let collections = cache
//!     .collections(token, || api.list_collections(), &cancel)
//!     .await?;
//!
//! // After a successful write
//! cache.invalidate_entity_type(EntityKind::Collections, token);
//! ```

pub mod key;
pub mod service;
pub mod traits;
pub mod ttl_store;

pub use key::{CacheKey, KeyDeriver, Sha256KeyDeriver};
pub use service::ResponseCache;
pub use traits::{CacheInvalidator, CacheStats, CachedEntity};
pub use ttl_store::{CacheConfig, TtlCache, DEFAULT_TTL};
