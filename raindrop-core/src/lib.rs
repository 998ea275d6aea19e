//! Raindrop Core - Entity Types
//!
//! Pure data structures shared by every crate in the workspace: the records
//! returned by the bookmark service, the response envelopes they arrive in,
//! the error taxonomy, configuration, and the upstream API trait.
//! This crate contains no caching or transport logic.

pub mod api;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod response;

pub use api::{FiltersQuery, ListRaindropsQuery, PageQuery, RaindropApi};
pub use config::{
    CacheSettings, RaindropConfig, DEFAULT_BULK_CHUNK_SIZE, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, MAX_CACHE_TTL_SECS,
};
pub use entities::{
    AvailableFilters, Collection, CollectionsMergeRequest, FilesInfo, FilterEntry, FilterMetric,
    Highlight, HighlightBulkUpdateRequest, HighlightUpdate, IdRef, Raindrop, RaindropBulkUpdate,
    RaindropCreateManyRequest, RaindropHighlights, TagDeleteRequest, TagInfo, TagRenameRequest,
    UserConfig, UserInfo, MAX_TEXT_FIELD_LENGTH,
};
pub use enums::EntityKind;
pub use error::{
    CacheError, ConfigError, RaindropError, RaindropResult, UpstreamError, ValidationError,
};
pub use response::{CacheableResponse, ItemResponse, ItemsResponse, SuccessResponse};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
