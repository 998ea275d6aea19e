//! Highlight tools.
//!
//! None of these reads are cached; every call goes upstream.

use super::raindrops::validate_paging;
use super::{cancellable, ToolDeps};
use raindrop_core::{
    Highlight, HighlightBulkUpdateRequest, HighlightUpdate, ItemResponse, ItemsResponse,
    PageQuery, RaindropHighlights, RaindropResult, ValidationError,
};
use tokio_util::sync::CancellationToken;

pub struct HighlightsTools {
    deps: ToolDeps,
}

impl HighlightsTools {
    pub fn new(deps: ToolDeps) -> Self {
        Self { deps }
    }

    /// Highlights across every bookmark.
    pub async fn list_highlights(
        &self,
        page: Option<i64>,
        per_page: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Highlight>> {
        validate_paging(page, per_page)?;
        let query = PageQuery { page, per_page };
        cancellable(cancel, self.deps.api().list_highlights(&query)).await
    }

    pub async fn list_highlights_by_collection(
        &self,
        collection_id: i64,
        page: Option<i64>,
        per_page: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Highlight>> {
        validate_paging(page, per_page)?;
        let query = PageQuery { page, per_page };
        cancellable(
            cancel,
            self.deps.api().list_collection_highlights(collection_id, &query),
        )
        .await
    }

    pub async fn get_bookmark_highlights(
        &self,
        raindrop_id: i64,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<RaindropHighlights>> {
        cancellable(cancel, self.deps.api().get_raindrop_highlights(raindrop_id)).await
    }

    /// Add a highlight to a bookmark. Any id on `highlight` is ignored.
    pub async fn create_highlight(
        &self,
        raindrop_id: i64,
        highlight: HighlightUpdate,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        if highlight.text.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ValidationError::RequiredFieldMissing {
                field: "text".to_string(),
            }
            .into());
        }
        let change = HighlightUpdate {
            id: None,
            ..highlight
        };
        self.apply(raindrop_id, change, cancel).await
    }

    /// Edit the text, note, or color of an existing highlight.
    pub async fn update_highlight(
        &self,
        raindrop_id: i64,
        highlight: HighlightUpdate,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        require_highlight_id(highlight.id.as_deref())?;
        if highlight.text.as_deref() == Some("") {
            // Empty text is the upstream removal marker.
            return Err(ValidationError::InvalidValue {
                field: "text".to_string(),
                reason: "empty text removes the highlight, use delete_highlight".to_string(),
            }
            .into());
        }
        self.apply(raindrop_id, highlight, cancel).await
    }

    pub async fn delete_highlight(
        &self,
        raindrop_id: i64,
        highlight_id: &str,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        require_highlight_id(Some(highlight_id))?;
        let change = HighlightUpdate {
            id: Some(highlight_id.to_string()),
            text: Some(String::new()),
            ..Default::default()
        };
        self.apply(raindrop_id, change, cancel).await
    }

    async fn apply(
        &self,
        raindrop_id: i64,
        change: HighlightUpdate,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        let payload = HighlightBulkUpdateRequest {
            highlights: vec![change],
        };
        let response =
            cancellable(cancel, self.deps.api().update_highlights(raindrop_id, &payload)).await?;
        if !response.is_ok() {
            tracing::debug!(raindrop_id, "highlight change not applied upstream");
        }
        Ok(response)
    }
}

fn require_highlight_id(id: Option<&str>) -> Result<(), ValidationError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::RequiredFieldMissing {
            field: "highlight_id".to_string(),
        }),
    }
}
