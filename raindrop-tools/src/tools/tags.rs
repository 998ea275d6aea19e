//! Tag tools.

use super::{cancellable, ToolDeps};
use raindrop_core::{
    EntityKind, ItemsResponse, RaindropResult, SuccessResponse, TagDeleteRequest, TagInfo,
    TagRenameRequest, ValidationError,
};
use tokio_util::sync::CancellationToken;

pub struct TagsTools {
    deps: ToolDeps,
}

impl TagsTools {
    pub fn new(deps: ToolDeps) -> Self {
        Self { deps }
    }

    /// All tags, or the tags used in one collection.
    ///
    /// Only the unscoped listing is cached.
    pub async fn list_tags(
        &self,
        collection_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<TagInfo>> {
        let api = self.deps.api();
        match collection_id {
            None => {
                self.deps
                    .cache()
                    .tags(self.deps.credential(), || api.list_tags(None), cancel)
                    .await
            }
            Some(id) => cancellable(cancel, api.list_tags(Some(id))).await,
        }
    }

    pub async fn rename_tag(
        &self,
        old_tag: &str,
        new_tag: &str,
        collection_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        self.rename_tags(&[old_tag.to_string()], new_tag, collection_id, cancel)
            .await
    }

    /// Merge `tags` into `new_tag`.
    pub async fn rename_tags(
        &self,
        tags: &[String],
        new_tag: &str,
        collection_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let tags = require_tags(tags)?;
        if new_tag.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "new_tag".to_string(),
            }
            .into());
        }

        let payload = TagRenameRequest {
            replace: Some(new_tag.to_string()),
            tags,
        };
        let response =
            cancellable(cancel, self.deps.api().rename_tags(collection_id, &payload)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Tags);
        Ok(response)
    }

    pub async fn delete_tag(
        &self,
        tag: &str,
        collection_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        self.delete_tags(&[tag.to_string()], collection_id, cancel)
            .await
    }

    /// Remove `tags` from every bookmark (or every bookmark in one collection).
    pub async fn delete_tags(
        &self,
        tags: &[String],
        collection_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let payload = TagDeleteRequest {
            tags: require_tags(tags)?,
        };
        let response =
            cancellable(cancel, self.deps.api().delete_tags(collection_id, &payload)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Tags);
        Ok(response)
    }
}

/// At least one non-blank tag; blank entries are dropped.
fn require_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let tags: Vec<String> = tags
        .iter()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect();
    if tags.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "tags".to_string(),
        });
    }
    Ok(tags)
}
