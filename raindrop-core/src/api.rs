//! Upstream API trait.
//!
//! The HTTP client in `raindrop-tools` implements this; tests substitute a
//! scripted mock. Every method returns the upstream envelope as a value so
//! that "not ok" answers stay distinguishable from transport failures.

use crate::entities::{
    AvailableFilters, Collection, CollectionsMergeRequest, Highlight, HighlightBulkUpdateRequest,
    Raindrop, RaindropBulkUpdate, RaindropCreateManyRequest, RaindropHighlights, TagDeleteRequest,
    TagInfo, TagRenameRequest, UserInfo,
};
use crate::error::RaindropResult;
use crate::response::{ItemResponse, ItemsResponse, SuccessResponse};
use async_trait::async_trait;
use serde::Serialize;

/// Query parameters for listing bookmarks in a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListRaindropsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(rename = "perpage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<bool>,
}

/// Page selection for highlight listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(rename = "perpage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

/// Query parameters for the filter summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FiltersQuery {
    #[serde(rename = "tagsSort", skip_serializing_if = "Option::is_none")]
    pub tags_sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// The bookmark service's REST surface.
#[async_trait]
pub trait RaindropApi: Send + Sync {
    // === Collections ===

    /// List root collections. The upstream endpoint is not paginated.
    async fn list_collections(&self) -> RaindropResult<ItemsResponse<Collection>>;

    /// List nested collections.
    async fn list_child_collections(&self) -> RaindropResult<ItemsResponse<Collection>>;

    async fn get_collection(&self, id: i64) -> RaindropResult<ItemResponse<Collection>>;

    async fn create_collection(
        &self,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>>;

    async fn update_collection(
        &self,
        id: i64,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>>;

    /// Remove a collection. Its bookmarks move to the Trash.
    async fn delete_collection(&self, id: i64) -> RaindropResult<SuccessResponse>;

    async fn merge_collections(
        &self,
        payload: &CollectionsMergeRequest,
    ) -> RaindropResult<SuccessResponse>;

    // === Tags ===

    /// List tags, across all collections or scoped to one.
    async fn list_tags(&self, collection_id: Option<i64>) -> RaindropResult<ItemsResponse<TagInfo>>;

    async fn rename_tags(
        &self,
        collection_id: Option<i64>,
        payload: &TagRenameRequest,
    ) -> RaindropResult<SuccessResponse>;

    async fn delete_tags(
        &self,
        collection_id: Option<i64>,
        payload: &TagDeleteRequest,
    ) -> RaindropResult<SuccessResponse>;

    // === User ===

    async fn get_user(&self) -> RaindropResult<ItemResponse<UserInfo>>;

    // === Bookmarks ===

    async fn get_raindrop(&self, id: i64) -> RaindropResult<ItemResponse<Raindrop>>;

    async fn create_raindrop(&self, raindrop: &Raindrop) -> RaindropResult<ItemResponse<Raindrop>>;

    async fn update_raindrop(
        &self,
        id: i64,
        raindrop: &Raindrop,
    ) -> RaindropResult<ItemResponse<Raindrop>>;

    /// Move a bookmark to the Trash.
    async fn delete_raindrop(&self, id: i64) -> RaindropResult<SuccessResponse>;

    async fn list_raindrops(
        &self,
        collection_id: i64,
        query: &ListRaindropsQuery,
    ) -> RaindropResult<ItemsResponse<Raindrop>>;

    /// Create up to one batch of bookmarks in a single call.
    async fn create_raindrops(
        &self,
        payload: &RaindropCreateManyRequest,
    ) -> RaindropResult<ItemsResponse<Raindrop>>;

    async fn update_raindrops(
        &self,
        collection_id: i64,
        update: &RaindropBulkUpdate,
        nested: Option<bool>,
        search: Option<&str>,
    ) -> RaindropResult<SuccessResponse>;

    // === Highlights ===

    /// List highlights across every bookmark.
    async fn list_highlights(&self, query: &PageQuery) -> RaindropResult<ItemsResponse<Highlight>>;

    async fn list_collection_highlights(
        &self,
        collection_id: i64,
        query: &PageQuery,
    ) -> RaindropResult<ItemsResponse<Highlight>>;

    /// Highlights attached to one bookmark.
    async fn get_raindrop_highlights(
        &self,
        raindrop_id: i64,
    ) -> RaindropResult<ItemResponse<RaindropHighlights>>;

    /// Apply a batch of highlight changes to a bookmark.
    async fn update_highlights(
        &self,
        raindrop_id: i64,
        payload: &HighlightBulkUpdateRequest,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>>;

    // === Filters ===

    /// Filter counts for a collection, or for every bookmark with id `0`.
    async fn get_filters(
        &self,
        collection_id: i64,
        query: &FiltersQuery,
    ) -> RaindropResult<AvailableFilters>;
}
