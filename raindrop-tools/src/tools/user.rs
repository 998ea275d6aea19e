//! Account tools.

use super::ToolDeps;
use raindrop_core::{ItemResponse, RaindropResult, UserInfo};
use tokio_util::sync::CancellationToken;

pub struct UserTools {
    deps: ToolDeps,
}

impl UserTools {
    pub fn new(deps: ToolDeps) -> Self {
        Self { deps }
    }

    /// The authenticated user's profile, cached per credential.
    pub async fn get_user_info(
        &self,
        cancel: &CancellationToken,
    ) -> RaindropResult<ItemResponse<UserInfo>> {
        let api = self.deps.api();
        self.deps
            .cache()
            .user_info(self.deps.credential(), || api.get_user(), cancel)
            .await
    }
}
