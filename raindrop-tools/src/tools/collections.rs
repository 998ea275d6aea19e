//! Collection tools.

use super::{cancellable, ToolDeps};
use raindrop_core::{
    Collection, CollectionsMergeRequest, EntityKind, ItemResponse, ItemsResponse, RaindropResult,
    SuccessResponse, ValidationError,
};
use tokio_util::sync::CancellationToken;

pub struct CollectionsTools {
    deps: ToolDeps,
}

impl CollectionsTools {
    pub fn new(deps: ToolDeps) -> Self {
        Self { deps }
    }

    /// Root collections. Served from the cache when a live entry exists.
    pub async fn list_collections(
        &self,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Collection>> {
        let api = self.deps.api();
        self.deps
            .cache()
            .collections(self.deps.credential(), || api.list_collections(), cancel)
            .await
    }

    pub async fn get_collection(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Collection>> {
        cancellable(cancel, self.deps.api().get_collection(id)).await
    }

    /// Nested collections. Not cached.
    pub async fn list_child_collections(
        &self,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemsResponse<Collection>> {
        cancellable(cancel, self.deps.api().list_child_collections()).await
    }

    pub async fn create_collection(
        &self,
        collection: &Collection,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Collection>> {
        let response = cancellable(cancel, self.deps.api().create_collection(collection)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    pub async fn update_collection(
        &self,
        id: i64,
        collection: &Collection,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<Collection>> {
        let response =
            cancellable(cancel, self.deps.api().update_collection(id, collection)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    /// Remove a collection. Its bookmarks move to the Trash.
    pub async fn delete_collection(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let response = cancellable(cancel, self.deps.api().delete_collection(id)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }

    /// Merge `ids` into the collection `to`.
    ///
    /// Duplicate source ids are collapsed. Fails validation when no source
    /// is given or when `to` is among the sources.
    pub async fn merge_collections(
        &self,
        to: i64,
        ids: &[i64],
        cancel: &CancellationToken,
    ) -> RaindropResult<SuccessResponse> {
        let payload = merge_request(to, ids)?;
        let response = cancellable(cancel, self.deps.api().merge_collections(&payload)).await?;
        self.deps.invalidate_if(response.is_ok(), EntityKind::Collections);
        Ok(response)
    }
}

fn merge_request(to: i64, ids: &[i64]) -> Result<CollectionsMergeRequest, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "ids".to_string(),
        });
    }
    if ids.contains(&to) {
        return Err(ValidationError::InvalidValue {
            field: "ids".to_string(),
            reason: "destination collection cannot be merged into itself".to_string(),
        });
    }

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    Ok(CollectionsMergeRequest { to, ids: unique })
}
