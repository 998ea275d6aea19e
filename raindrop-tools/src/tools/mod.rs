//! Tool services.
//!
//! Each service is a thin layer over [`RaindropApi`]: it validates
//! arguments, routes cacheable reads through the shared [`ResponseCache`],
//! and invalidates the caller's cached reads after a successful write.
//! Highlights and filters pass straight through.

pub mod collections;
pub mod filters;
pub mod highlights;
pub mod raindrops;
pub mod tags;
pub mod user;

pub use collections::CollectionsTools;
pub use filters::{FiltersTools, VALID_TAGS_SORT_OPTIONS};
pub use highlights::HighlightsTools;
pub use raindrops::{RaindropsTools, MAX_PER_PAGE, VALID_SORT_OPTIONS};
pub use tags::TagsTools;
pub use user::UserTools;

use raindrop_cache::{CacheInvalidator, ResponseCache};
use raindrop_core::{EntityKind, RaindropApi, RaindropError, RaindropResult};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What every tool service needs: the upstream client, the process-wide
/// cache, and the credential the caller authenticates with.
#[derive(Clone)]
pub struct ToolDeps {
    api: Arc<dyn RaindropApi>,
    cache: Arc<ResponseCache>,
    credential: Arc<SecretString>,
}

impl ToolDeps {
    pub fn new(api: Arc<dyn RaindropApi>, cache: Arc<ResponseCache>, credential: SecretString) -> Self {
        Self {
            api,
            cache,
            credential: Arc::new(credential),
        }
    }

    pub fn api(&self) -> &dyn RaindropApi {
        self.api.as_ref()
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub(crate) fn credential(&self) -> &str {
        self.credential.expose_secret()
    }

    /// Invalidate `kind` for this caller when `succeeded` is true.
    pub(crate) fn invalidate_if(&self, succeeded: bool, kind: EntityKind) {
        if succeeded {
            self.cache.invalidate_entity_type(kind, self.credential());
        }
    }
}

/// Run an upstream call, abandoning it if `cancel` fires first.
pub(crate) async fn cancellable<T, Fut>(cancel: &CancellationToken, call: Fut) -> RaindropResult<T>
where
    Fut: Future<Output = RaindropResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(RaindropError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RaindropError::Cancelled),
        result = call => result,
    }
}
