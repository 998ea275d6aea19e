//! Raindrop Tools - Tool Layer
//!
//! Tool services for collections, tags, the user profile, bookmarks,
//! highlights, and filters.
//! Reads of the collection list, the global tag list, and the profile go
//! through the shared [`ResponseCache`](raindrop_cache::ResponseCache);
//! successful writes invalidate the affected entity kind for the caller.

pub mod context;
pub mod http;
pub mod telemetry;
pub mod tools;

pub use context::ToolContext;
pub use http::HttpRaindropClient;
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};
pub use tools::{
    CollectionsTools, FiltersTools, HighlightsTools, RaindropsTools, TagsTools, ToolDeps,
    UserTools, MAX_PER_PAGE, VALID_SORT_OPTIONS, VALID_TAGS_SORT_OPTIONS,
};
