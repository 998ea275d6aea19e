//! Raindrop Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted [`RaindropApi`] mock that counts calls and records payloads
//! - Proptest generators for entity types
//! - Fixtures for common scenarios
//! - Assertions for Raindrop-specific results

pub use raindrop_cache::{CacheConfig, ResponseCache};
pub use raindrop_core::{
    AvailableFilters, Collection, CollectionsMergeRequest, EntityKind, FilterEntry, FilterMetric,
    FiltersQuery, Highlight, HighlightBulkUpdateRequest, IdRef, ItemResponse, ItemsResponse,
    ListRaindropsQuery, PageQuery, Raindrop, RaindropApi, RaindropBulkUpdate, RaindropConfig,
    RaindropCreateManyRequest, RaindropError, RaindropHighlights, RaindropResult,
    SuccessResponse, TagDeleteRequest, TagInfo, TagRenameRequest, UpstreamError, UserInfo,
    ValidationError,
};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// ============================================================================
// MOCK UPSTREAM
// ============================================================================

/// Scripted stand-in for the bookmark service.
///
/// Every method counts its calls under its own name (`"list_collections"`,
/// `"create_raindrops"`, ...). Read responses can be swapped while a test
/// runs; writes succeed unless told otherwise.
pub struct MockRaindropApi {
    state: Mutex<MockState>,
    delay: Option<Duration>,
}

struct MockState {
    calls: HashMap<&'static str, usize>,
    collections: ItemsResponse<Collection>,
    tags: ItemsResponse<TagInfo>,
    user: ItemResponse<UserInfo>,
    bookmarks: ItemsResponse<Raindrop>,
    writes_ok: bool,
    failing_methods: HashSet<&'static str>,
    reject_create_chunk: Option<usize>,
    create_chunks: Vec<RaindropCreateManyRequest>,
    highlight_updates: Vec<(i64, HighlightBulkUpdateRequest)>,
    filters_queries: Vec<(i64, FiltersQuery)>,
    next_id: i64,
}

impl MockRaindropApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: HashMap::new(),
                collections: ItemsResponse::ok(fixtures::collections(3)),
                tags: ItemsResponse::ok(fixtures::tags(&["rust", "async", "cache"])),
                user: ItemResponse::ok(fixtures::user_info()),
                bookmarks: ItemsResponse::ok(fixtures::raindrops(2)),
                writes_ok: true,
                failing_methods: HashSet::new(),
                reject_create_chunk: None,
                create_chunks: Vec::new(),
                highlight_updates: Vec::new(),
                filters_queries: Vec::new(),
                next_id: 1000,
            }),
            delay: None,
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Writes answer with `result: false`.
    pub fn rejecting_writes(self) -> Self {
        self.state().writes_ok = false;
        self
    }

    /// The zero-based create-many call `index` answers with `result: false`.
    pub fn rejecting_create_chunk(self, index: usize) -> Self {
        self.state().reject_create_chunk = Some(index);
        self
    }

    /// Calls to `method` fail with a transport error.
    pub fn failing(self, method: &'static str) -> Self {
        self.state().failing_methods.insert(method);
        self
    }

    pub fn set_collections(&self, response: ItemsResponse<Collection>) {
        self.state().collections = response;
    }

    pub fn set_tags(&self, response: ItemsResponse<TagInfo>) {
        self.state().tags = response;
    }

    pub fn set_user(&self, response: ItemResponse<UserInfo>) {
        self.state().user = response;
    }

    /// Number of calls made to `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.state().calls.get(method).copied().unwrap_or(0)
    }

    /// Calls across every method.
    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    /// Payloads received by `create_raindrops`, in call order.
    pub fn create_chunks(&self) -> Vec<RaindropCreateManyRequest> {
        self.state().create_chunks.clone()
    }

    pub fn create_chunk_sizes(&self) -> Vec<usize> {
        self.state()
            .create_chunks
            .iter()
            .map(|chunk| chunk.items.len())
            .collect()
    }

    /// Bookmark id and payload of every `update_highlights` call.
    pub fn highlight_updates(&self) -> Vec<(i64, HighlightBulkUpdateRequest)> {
        self.state().highlight_updates.clone()
    }

    /// Collection id and query of every `get_filters` call.
    pub fn filters_queries(&self) -> Vec<(i64, FiltersQuery)> {
        self.state().filters_queries.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out the delay, then fail if scripted to.
    async fn enter(&self, method: &'static str) -> RaindropResult<()> {
        let fail = {
            let mut state = self.state();
            *state.calls.entry(method).or_insert(0) += 1;
            state.failing_methods.contains(method)
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(UpstreamError::Status {
                endpoint: method.to_string(),
                status: 502,
                message: "bad gateway".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn write_result(&self) -> SuccessResponse {
        SuccessResponse::new(self.state().writes_ok)
    }

    fn write_item<T>(&self, item: T) -> ItemResponse<T> {
        if self.state().writes_ok {
            ItemResponse::ok(item)
        } else {
            ItemResponse::failed()
        }
    }

    fn assign_id(&self) -> i64 {
        let mut state = self.state();
        state.next_id += 1;
        state.next_id
    }
}

impl Default for MockRaindropApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RaindropApi for MockRaindropApi {
    async fn list_collections(&self) -> RaindropResult<ItemsResponse<Collection>> {
        self.enter("list_collections").await?;
        Ok(self.state().collections.clone())
    }

    async fn list_child_collections(&self) -> RaindropResult<ItemsResponse<Collection>> {
        self.enter("list_child_collections").await?;
        Ok(ItemsResponse::ok(vec![]))
    }

    async fn get_collection(&self, id: i64) -> RaindropResult<ItemResponse<Collection>> {
        self.enter("get_collection").await?;
        Ok(ItemResponse::ok(fixtures::collection(id, "Fetched")))
    }

    async fn create_collection(
        &self,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>> {
        self.enter("create_collection").await?;
        let created = Collection {
            id: self.assign_id(),
            ..collection.clone()
        };
        Ok(self.write_item(created))
    }

    async fn update_collection(
        &self,
        id: i64,
        collection: &Collection,
    ) -> RaindropResult<ItemResponse<Collection>> {
        self.enter("update_collection").await?;
        Ok(self.write_item(Collection {
            id,
            ..collection.clone()
        }))
    }

    async fn delete_collection(&self, _id: i64) -> RaindropResult<SuccessResponse> {
        self.enter("delete_collection").await?;
        Ok(self.write_result())
    }

    async fn merge_collections(
        &self,
        _payload: &CollectionsMergeRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.enter("merge_collections").await?;
        Ok(self.write_result())
    }

    async fn list_tags(&self, collection_id: Option<i64>) -> RaindropResult<ItemsResponse<TagInfo>> {
        self.enter("list_tags").await?;
        match collection_id {
            None => Ok(self.state().tags.clone()),
            Some(_) => Ok(ItemsResponse::ok(fixtures::tags(&["scoped"]))),
        }
    }

    async fn rename_tags(
        &self,
        _collection_id: Option<i64>,
        _payload: &TagRenameRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.enter("rename_tags").await?;
        Ok(self.write_result())
    }

    async fn delete_tags(
        &self,
        _collection_id: Option<i64>,
        _payload: &TagDeleteRequest,
    ) -> RaindropResult<SuccessResponse> {
        self.enter("delete_tags").await?;
        Ok(self.write_result())
    }

    async fn get_user(&self) -> RaindropResult<ItemResponse<UserInfo>> {
        self.enter("get_user").await?;
        Ok(self.state().user.clone())
    }

    async fn get_raindrop(&self, id: i64) -> RaindropResult<ItemResponse<Raindrop>> {
        self.enter("get_raindrop").await?;
        Ok(ItemResponse::ok(Raindrop {
            id,
            ..fixtures::raindrop(id as usize)
        }))
    }

    async fn create_raindrop(&self, raindrop: &Raindrop) -> RaindropResult<ItemResponse<Raindrop>> {
        self.enter("create_raindrop").await?;
        let created = Raindrop {
            id: self.assign_id(),
            ..raindrop.clone()
        };
        Ok(self.write_item(created))
    }

    async fn update_raindrop(
        &self,
        id: i64,
        raindrop: &Raindrop,
    ) -> RaindropResult<ItemResponse<Raindrop>> {
        self.enter("update_raindrop").await?;
        Ok(self.write_item(Raindrop {
            id,
            ..raindrop.clone()
        }))
    }

    async fn delete_raindrop(&self, _id: i64) -> RaindropResult<SuccessResponse> {
        self.enter("delete_raindrop").await?;
        Ok(self.write_result())
    }

    async fn list_raindrops(
        &self,
        _collection_id: i64,
        _query: &ListRaindropsQuery,
    ) -> RaindropResult<ItemsResponse<Raindrop>> {
        self.enter("list_raindrops").await?;
        Ok(self.state().bookmarks.clone())
    }

    async fn create_raindrops(
        &self,
        payload: &RaindropCreateManyRequest,
    ) -> RaindropResult<ItemsResponse<Raindrop>> {
        self.enter("create_raindrops").await?;
        let mut state = self.state();
        let index = state.create_chunks.len();
        state.create_chunks.push(payload.clone());
        if !state.writes_ok || state.reject_create_chunk == Some(index) {
            return Ok(ItemsResponse::failed(vec![]));
        }

        let mut created = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            state.next_id += 1;
            created.push(Raindrop {
                id: state.next_id,
                collection_id: payload.collection_id,
                ..item.clone()
            });
        }
        Ok(ItemsResponse::ok(created))
    }

    async fn update_raindrops(
        &self,
        _collection_id: i64,
        _update: &RaindropBulkUpdate,
        _nested: Option<bool>,
        _search: Option<&str>,
    ) -> RaindropResult<SuccessResponse> {
        self.enter("update_raindrops").await?;
        Ok(self.write_result())
    }

    async fn list_highlights(&self, _query: &PageQuery) -> RaindropResult<ItemsResponse<Highlight>> {
        self.enter("list_highlights").await?;
        Ok(ItemsResponse::ok(vec![
            fixtures::highlight("h1", "first"),
            fixtures::highlight("h2", "second"),
        ]))
    }

    async fn list_collection_highlights(
        &self,
        _collection_id: i64,
        _query: &PageQuery,
    ) -> RaindropResult<ItemsResponse<Highlight>> {
        self.enter("list_collection_highlights").await?;
        Ok(ItemsResponse::ok(vec![fixtures::highlight("h1", "first")]))
    }

    async fn get_raindrop_highlights(
        &self,
        raindrop_id: i64,
    ) -> RaindropResult<ItemResponse<RaindropHighlights>> {
        self.enter("get_raindrop_highlights").await?;
        Ok(ItemResponse::ok(RaindropHighlights {
            id: Some(raindrop_id),
            highlights: vec![fixtures::highlight("h1", "first")],
        }))
    }

    async fn update_highlights(
        &self,
        raindrop_id: i64,
        payload: &HighlightBulkUpdateRequest,
    ) -> RaindropResult<ItemResponse<HighlightBulkUpdateRequest>> {
        self.enter("update_highlights").await?;
        self.state()
            .highlight_updates
            .push((raindrop_id, payload.clone()));
        Ok(self.write_item(payload.clone()))
    }

    async fn get_filters(
        &self,
        collection_id: i64,
        query: &FiltersQuery,
    ) -> RaindropResult<AvailableFilters> {
        self.enter("get_filters").await?;
        self.state()
            .filters_queries
            .push((collection_id, query.clone()));
        Ok(AvailableFilters {
            result: true,
            important: Some(FilterMetric { count: 1 }),
            tags: Some(vec![FilterEntry {
                id: "rust".to_string(),
                count: 2,
            }]),
            ..Default::default()
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating test data.

    use super::*;
    use proptest::prelude::*;

    /// Non-empty API token.
    pub fn arb_credential() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,48}"
    }

    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Collections),
            Just(EntityKind::Tags),
            Just(EntityKind::User),
        ]
    }

    pub fn arb_tag() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    pub fn arb_collection() -> impl Strategy<Value = Collection> {
        (1i64..1_000_000, "[A-Za-z ]{1,32}", 0i64..10_000).prop_map(|(id, title, count)| {
            Collection {
                id,
                title: Some(title),
                count,
                ..Default::default()
            }
        })
    }

    /// A bookmark that passes create validation.
    pub fn arb_new_raindrop() -> impl Strategy<Value = Raindrop> {
        (
            "[a-z]{1,12}",
            proptest::option::of("[A-Za-z ]{1,40}"),
            proptest::option::of(proptest::collection::vec(arb_tag(), 0..4)),
        )
            .prop_map(|(host, title, tags)| Raindrop {
                title,
                tags,
                ..Raindrop::new(format!("https://{}.example.com", host))
            })
    }

    pub fn arb_new_raindrops(max: usize) -> impl Strategy<Value = Vec<Raindrop>> {
        proptest::collection::vec(arb_new_raindrop(), 0..=max)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    pub const TEST_CREDENTIAL: &str = "test-token-alice";
    pub const OTHER_CREDENTIAL: &str = "test-token-bob";

    pub fn collection(id: i64, title: &str) -> Collection {
        Collection {
            id,
            title: Some(title.to_string()),
            count: 0,
            created: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// `n` root collections with ids starting at 1.
    pub fn collections(n: usize) -> Vec<Collection> {
        (1..=n)
            .map(|i| collection(i as i64, &format!("Collection {}", i)))
            .collect()
    }

    pub fn tag(name: &str, count: i64) -> TagInfo {
        TagInfo {
            id: name.to_string(),
            count,
        }
    }

    pub fn tags(names: &[&str]) -> Vec<TagInfo> {
        names.iter().map(|name| tag(name, 1)).collect()
    }

    pub fn user_info() -> UserInfo {
        UserInfo {
            id: 42,
            email: Some("reader@example.com".to_string()),
            full_name: Some("Test Reader".to_string()),
            pro: true,
            ..Default::default()
        }
    }

    /// A new (unsaved) bookmark with a link unique to `index`.
    pub fn raindrop(index: usize) -> Raindrop {
        Raindrop::new(format!("https://example.com/{}", index)).with_title(format!("Item {}", index))
    }

    /// `n` new bookmarks, links numbered from 0.
    pub fn raindrops(n: usize) -> Vec<Raindrop> {
        (0..n).map(raindrop).collect()
    }

    pub fn highlight(id: &str, text: &str) -> Highlight {
        Highlight {
            id: Some(id.to_string()),
            text: Some(text.to_string()),
            color: Some("yellow".to_string()),
            ..Default::default()
        }
    }

    /// Valid config pointing at a local address that is never contacted.
    pub fn test_config() -> RaindropConfig {
        RaindropConfig::new(TEST_CREDENTIAL, "http://127.0.0.1:9/rest/v1")
    }

    pub fn test_cache() -> Arc<ResponseCache> {
        Arc::new(ResponseCache::new(CacheConfig::default()))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for Raindrop-specific results.

    use super::*;

    #[track_caller]
    pub fn assert_cancelled<T: std::fmt::Debug>(result: &RaindropResult<T>) {
        match result {
            Err(RaindropError::Cancelled) => {}
            other => panic!("Expected Cancelled, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &RaindropResult<T>) {
        match result {
            Err(RaindropError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_upstream_error<T: std::fmt::Debug>(result: &RaindropResult<T>) {
        match result {
            Err(RaindropError::Upstream(_)) => {}
            other => panic!("Expected Upstream error, got: {:?}", other),
        }
    }

    /// Assert that bookmarks keep the order of their links.
    #[track_caller]
    pub fn assert_same_links(actual: &[Raindrop], expected: &[Raindrop]) {
        let actual: Vec<&str> = actual.iter().map(|r| r.link.as_str()).collect();
        let expected: Vec<&str> = expected.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(actual, expected, "Bookmark links differ");
    }
}

// ============================================================================
// TESTS
// ============================================================================
