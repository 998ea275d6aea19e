//! Bookmark tools.

use super::{cancellable, ToolDeps};
use raindrop_cache::{BulkWriteOutcome, BulkWritePipeline, CacheInvalidator};
use raindrop_core::{
    EntityKind, ItemResponse, ItemsResponse, ListRaindropsQuery, Raindrop, RaindropBulkUpdate,
    RaindropCreateManyRequest, RaindropResult, SuccessResponse, ValidationError,
    MAX_TEXT_FIELD_LENGTH,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Largest page the list endpoint serves.
pub const MAX_PER_PAGE: i64 = 50;

/// Sort orders accepted by the list endpoint.
pub const VALID_SORT_OPTIONS: [&str; 8] = [
    "created", "-created", "title", "-title", "domain", "-domain", "sort", "score",
];

pub struct RaindropsTools {
    deps: ToolDeps,
    pipeline: BulkWritePipeline,
}

impl RaindropsTools {
    /// Bulk creates are split into chunks of `chunk_size`.
    pub fn new(deps: ToolDeps, chunk_size: usize) -> RaindropResult<Self> {
        let invalidator: Arc<dyn CacheInvalidator> = deps.cache().clone();
        let pipeline = BulkWritePipeline::new(chunk_size, EntityKind::Collections, invalidator)?;
        Ok(Self { deps, pipeline })
    }

    pub fn chunk_size(&self) -> usize {
        self.pipeline.chunk_size()
    }

    pub async fn get_bookmark(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Raindrop>> {
        cancellable(cancel, self.deps.api().get_raindrop(id)).await
    }

    /// Create one bookmark. The link is required.
    pub async fn create_bookmark(
        &self,
        raindrop: &Raindrop,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Raindrop>> {
        validate_new_raindrop(raindrop)?;
        let response = cancellable(cancel, self.deps.api().create_raindrop(raindrop)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    /// Apply a partial update; unset fields are left unchanged.
    pub async fn update_bookmark(
        &self,
        id: i64,
        raindrop: &Raindrop,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Raindrop>> {
        validate_text_fields(raindrop)?;
        let response = cancellable(cancel, self.deps.api().update_raindrop(id, raindrop)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    /// Move a bookmark to the Trash.
    pub async fn delete_bookmark(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let response = cancellable(cancel, self.deps.api().delete_raindrop(id)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    /// One page of bookmarks from a collection.
    ///
    /// Use 0 for all bookmarks, -1 for Unsorted, -99 for the Trash.
    pub async fn list_bookmarks(
        &self,
        collection_id: i64,
        query: &ListRaindropsQuery,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Raindrop>> {
        validate_list_query(query)?;
        cancellable(cancel, self.deps.api().list_raindrops(collection_id, query)).await
    }

    /// Create many bookmarks, sent upstream in chunks.
    ///
    /// Every item is validated before the first call. Stops at the first
    /// failing chunk; the outcome carries whatever was written before it.
    pub async fn create_bookmarks(
        &self,
        collection_id: Option<i64>,
        raindrops: Vec<Raindrop>,
        cancel: &CancellationToken,
    ) -> RaindropResult<BulkWriteOutcome<Raindrop>> {
        for raindrop in &raindrops {
            validate_new_raindrop(raindrop)?;
        }

        let api = self.deps.api();
        let outcome = self
            .pipeline
            .execute(
                self.deps.credential(),
                raindrops,
                |chunk| {
                    let payload = RaindropCreateManyRequest {
                        collection_id,
                        items: chunk,
                    };
                    async move { api.create_raindrops(&payload).await }
                },
                cancel,
            )
            .await?;

        if outcome.is_partial() {
            tracing::warn!(
                written = outcome.items.len(),
                chunks = outcome.chunks_dispatched,
                of = outcome.chunks_total,
                "bulk bookmark create partially applied"
            );
        }
        Ok(outcome)
    }

    /// Bulk update bookmarks in a collection.
    ///
    /// Without `update.ids`, every bookmark matching `search` (or the whole
    /// collection) is affected.
    pub async fn update_bookmarks(
        &self,
        collection_id: i64,
        update: &RaindropBulkUpdate,
        nested: Option<bool>,
        search: Option<&str>,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let response = cancellable(
            cancel,
            self.deps
                .api()
                .update_raindrops(collection_id, update, nested, search),
        )
        .await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }
}

fn validate_new_raindrop(raindrop: &Raindrop) -> Result<(), ValidationError> {
    if raindrop.link.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "link".to_string(),
        });
    }
    validate_text_fields(raindrop)
}

fn validate_text_fields(raindrop: &Raindrop) -> Result<(), ValidationError> {
    for (field, value) in [("excerpt", &raindrop.excerpt), ("note", &raindrop.note)] {
        let length = value.as_deref().map_or(0, |v| v.chars().count());
        if length > MAX_TEXT_FIELD_LENGTH {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                value: length as i64,
                min: 0,
                max: MAX_TEXT_FIELD_LENGTH as i64,
            });
        }
    }
    Ok(())
}

/// Zero-based page and a page size within what the service serves.
pub(super) fn validate_paging(
    page: Option<i64>,
    per_page: Option<i64>,
) -> Result<(), ValidationError> {
    if let Some(page) = page {
        if page < 0 {
            return Err(ValidationError::InvalidValue {
                field: "page".to_string(),
                reason: "page number cannot be negative".to_string(),
            });
        }
    }
    if let Some(per_page) = per_page {
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(ValidationError::OutOfRange {
                field: "per_page".to_string(),
                value: per_page,
                min: 1,
                max: MAX_PER_PAGE,
            });
        }
    }
    Ok(())
}

fn validate_list_query(query: &ListRaindropsQuery) -> Result<(), ValidationError> {
    validate_paging(query.page, query.per_page)?;
    if let Some(sort) = query.sort.as_deref() {
        if !VALID_SORT_OPTIONS.contains(&sort) {
            return Err(ValidationError::InvalidValue {
                field: "sort".to_string(),
                reason: format!("valid values are {}", VALID_SORT_OPTIONS.join(", ")),
            });
        }
        let has_search = query.search.as_deref().is_some_and(|s| !s.trim().is_empty());
        if sort == "score" && !has_search {
            return Err(ValidationError::InvalidValue {
                field: "sort".to_string(),
                reason: "'score' is only allowed with a search query".to_string(),
            });
        }
    }
    Ok(())
}
