//! Records exchanged with the bookmark service.
//!
//! Field names follow the upstream JSON: identifiers arrive as `_id`,
//! references as `{ "$id": .. }`, everything else in camelCase.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Maximum length for free-text bookmark fields such as excerpt and note.
pub const MAX_TEXT_FIELD_LENGTH: usize = 10_000;

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Reference to another entity by its identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(rename = "$id")]
    pub id: i64,
}

impl IdRef {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

// ============================================================================
// COLLECTIONS
// ============================================================================

/// A bookmark collection (folder).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Collection {
    #[serde(rename = "_id", skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Number of bookmarks in the collection
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Payload for merging collections into a destination collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionsMergeRequest {
    /// Destination collection
    pub to: i64,
    /// Source collections
    pub ids: Vec<i64>,
}

// ============================================================================
// TAGS
// ============================================================================

/// A tag and the number of bookmarks carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagInfo {
    /// The tag text itself
    #[serde(rename = "_id")]
    pub id: String,
    pub count: i64,
}

/// Payload for renaming (merging) tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRenameRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
    pub tags: Vec<String>,
}

/// Payload for removing tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDeleteRequest {
    pub tags: Vec<String>,
}

// ============================================================================
// USER
// ============================================================================

/// The authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    #[serde(rename = "_id")]
    pub id: i64,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub pro: bool,
    pub config: Option<UserConfig>,
    pub files: Option<FilesInfo>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Per-user UI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub broken_level: Option<String>,
    pub font_color: Option<String>,
    pub font_size: Option<i64>,
    pub lang: Option<String>,
    pub last_collection: Option<i64>,
    pub raindrops_sort: Option<String>,
    pub raindrops_view: Option<String>,
}

/// File storage usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesInfo {
    pub used: Option<i64>,
    pub size: Option<i64>,
    pub last_check_point: Option<Timestamp>,
}

// ============================================================================
// BOOKMARKS
// ============================================================================

/// A single bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Raindrop {
    #[serde(rename = "_id", skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Empty on partial updates that leave the link unchanged.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
}

impl Raindrop {
    /// Bookmark pointing at `link` with every optional field unset.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Payload for creating many bookmarks in one upstream call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaindropCreateManyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
    pub items: Vec<Raindrop>,
}

/// Bulk update applied to bookmarks in a collection.
///
/// Moving items to collection `-99` sends them to the Trash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaindropBulkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<IdRef>,
}

// ============================================================================
// HIGHLIGHTS
// ============================================================================

/// A passage highlighted inside a bookmarked page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Highlight {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Title of the bookmark the highlight belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
    /// Owning bookmark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raindrop_ref: Option<i64>,
}

/// One change in a highlight batch.
///
/// An entry without an id creates a highlight. Empty text with an id
/// removes the highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightUpdate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Payload carrying highlight changes for one bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightBulkUpdateRequest {
    pub highlights: Vec<HighlightUpdate>,
}

/// The highlights attached to one bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaindropHighlights {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub highlights: Vec<Highlight>,
}

// ============================================================================
// FILTERS
// ============================================================================

/// Filter counts for a collection, or for every bookmark with collection `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableFilters {
    pub result: bool,
    /// Bookmarks whose link is broken
    pub broken: Option<FilterMetric>,
    pub duplicates: Option<FilterMetric>,
    /// Bookmarks marked as favorite
    pub important: Option<FilterMetric>,
    /// Bookmarks without any tag
    #[serde(rename = "notag")]
    pub no_tag: Option<FilterMetric>,
    pub tags: Option<Vec<FilterEntry>>,
    pub types: Option<Vec<FilterEntry>>,
}

impl AvailableFilters {
    pub fn is_ok(&self) -> bool {
        self.result
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterMetric {
    pub count: i64,
}

/// A tag or content type with the number of bookmarks matching it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub count: i64,
}
