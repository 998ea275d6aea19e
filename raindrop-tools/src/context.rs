//! Wiring for the tool services.

use crate::http::HttpRaindropClient;
use crate::tools::{
    CollectionsTools, FiltersTools, HighlightsTools, RaindropsTools, TagsTools, ToolDeps,
    UserTools,
};
use raindrop_cache::{CacheConfig, ResponseCache};
use raindrop_core::{RaindropApi, RaindropConfig, RaindropResult};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// All tool services for one credential.
///
/// Build one `ResponseCache` per process and pass the same `Arc` to every
/// context; partitions inside it keep users apart.
pub struct ToolContext {
    pub collections: CollectionsTools,
    pub tags: TagsTools,
    pub user: UserTools,
    pub raindrops: RaindropsTools,
    pub highlights: HighlightsTools,
    pub filters: FiltersTools,
    cache: Arc<ResponseCache>,
}

impl ToolContext {
    /// Build the HTTP client and a fresh cache from configuration.
    pub fn from_config(config: &RaindropConfig) -> RaindropResult<Self> {
        config.validate()?;
        let api: Arc<dyn RaindropApi> = Arc::new(HttpRaindropClient::new(config)?);
        let cache = Arc::new(ResponseCache::new(
            CacheConfig::new().with_ttl(config.cache.ttl()),
        ));
        let credential = SecretString::from(config.api_token.expose_secret().to_string());

        tracing::info!(
            base_url = %config.base_url,
            ttl_secs = config.cache.ttl_secs,
            bulk_chunk_size = config.cache.bulk_chunk_size,
            "tool context initialized"
        );
        Self::new(api, cache, credential, config.cache.bulk_chunk_size)
    }

    pub fn new(
        api: Arc<dyn RaindropApi>,
        cache: Arc<ResponseCache>,
        credential: SecretString,
        bulk_chunk_size: usize,
    ) -> RaindropResult<Self> {
        let deps = ToolDeps::new(api, cache.clone(), credential);
        Ok(Self {
            collections: CollectionsTools::new(deps.clone()),
            tags: TagsTools::new(deps.clone()),
            user: UserTools::new(deps.clone()),
            highlights: HighlightsTools::new(deps.clone()),
            filters: FiltersTools::new(deps.clone()),
            raindrops: RaindropsTools::new(deps, bulk_chunk_size)?,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raindrop_core::{ConfigError, RaindropError};

    #[test]
    fn test_from_config_uses_configured_chunk_size() {
        let mut config = RaindropConfig::new("token", "https://api.raindrop.io/rest/v1");
        config.cache.bulk_chunk_size = 25;
        let context = ToolContext::from_config(&config).unwrap();
        assert_eq!(context.raindrops.chunk_size(), 25);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = RaindropConfig::new("token", "not-a-url");
        let err = ToolContext::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            RaindropError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_config_rejects_ttl_past_one_day() {
        let mut config = RaindropConfig::new("token", "https://api.raindrop.io/rest/v1");
        config.cache.ttl_secs = i64::MAX as u64;
        let err = ToolContext::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            RaindropError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "cache.ttl_secs"
        ));
    }
}
