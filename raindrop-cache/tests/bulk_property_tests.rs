//! Property-Based Tests for Chunked Bulk Writes
//!
//! **Property 4: Ordered Chunking**
//! For any input, the upstream sees `ceil(n / chunk_size)` calls whose
//! concatenated payloads equal the input in order, and every chunk except
//! the last is full.
//!
//! **Property 5: Fail Fast**
//! The first failing chunk stops the run; the outcome carries exactly the
//! items of the chunks before it, and the cache is invalidated once if any
//! item was written.

use proptest::prelude::*;
use raindrop_cache::{BulkWritePipeline, CacheInvalidator, ResponseCache, DEFAULT_CHUNK_SIZE};
use raindrop_core::{
    Collection, EntityKind, ItemsResponse, RaindropError, RaindropResult, UpstreamError,
};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

/// Counts invalidation calls per kind.
#[derive(Default)]
struct CountingInvalidator {
    calls: Mutex<Vec<EntityKind>>,
}

impl CountingInvalidator {
    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CacheInvalidator for CountingInvalidator {
    fn invalidate_entity_type(&self, kind: EntityKind, _raw_credential: &str) {
        self.calls.lock().unwrap().push(kind);
    }

    fn invalidate_all(&self, _raw_credential: &str) {
        self.calls.lock().unwrap().extend(EntityKind::ALL);
    }
}

/// Upstream stand-in that records every chunk and fails on a chosen call.
#[derive(Clone, Default)]
struct Upstream {
    chunks: Arc<Mutex<Vec<Vec<u32>>>>,
    reject_call: Option<usize>,
    error_call: Option<usize>,
}

impl Upstream {
    fn write(&self, chunk: Vec<u32>) -> impl std::future::Future<Output = RaindropResult<ItemsResponse<u32>>> {
        let call = {
            let mut chunks = self.chunks.lock().unwrap();
            chunks.push(chunk.clone());
            chunks.len()
        };
        let reject = self.reject_call == Some(call);
        let error = self.error_call == Some(call);
        async move {
            if error {
                return Err(RaindropError::from(UpstreamError::Request {
                    endpoint: "/raindrops".to_string(),
                    reason: "connection reset".to_string(),
                }));
            }
            if reject {
                return Ok(ItemsResponse::failed(vec![]));
            }
            Ok(ItemsResponse::ok(chunk))
        }
    }

    fn sizes(&self) -> Vec<usize> {
        self.chunks.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn flattened(&self) -> Vec<u32> {
        self.chunks.lock().unwrap().concat()
    }
}

fn items(n: u32) -> Vec<u32> {
    (0..n).collect()
}

fn pipeline(invalidator: Arc<CountingInvalidator>) -> BulkWritePipeline {
    BulkWritePipeline::new(DEFAULT_CHUNK_SIZE, EntityKind::Collections, invalidator).unwrap()
}

// ============================================================================
// PROPERTY 4: ORDERED CHUNKING
// ============================================================================

#[tokio::test]
async fn test_150_items_split_100_then_50() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", items(150), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(outcome.ok);
    assert_eq!(upstream.sizes(), vec![100, 50]);
    assert_eq!(outcome.items, items(150));
    assert_eq!(outcome.chunks_dispatched, 2);
    assert_eq!(outcome.chunks_total, 2);
    assert_eq!(invalidator.count(), 1);
}

#[tokio::test]
async fn test_250_items_preserve_order_across_three_calls() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", items(250), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert_eq!(upstream.sizes(), vec![100, 100, 50]);
    assert_eq!(upstream.flattened(), items(250));
    assert_eq!(outcome.items, items(250));
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_call() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator)
        .execute("token", items(200), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert_eq!(upstream.sizes(), vec![100, 100]);
    assert_eq!(outcome.chunks_total, 2);
}

#[tokio::test]
async fn test_empty_input_makes_no_calls_and_no_invalidation() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", Vec::new(), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(outcome.ok);
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.chunks_total, 0);
    assert!(upstream.sizes().is_empty());
    assert_eq!(invalidator.count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chunks_cover_input_in_order(n in 0u32..450, chunk_size in 1usize..=100) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let invalidator = Arc::new(CountingInvalidator::default());
            let upstream = Upstream::default();
            let cancel = CancellationToken::new();
            let pipeline = BulkWritePipeline::new(chunk_size, EntityKind::Collections, invalidator.clone())
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let outcome = pipeline
                .execute("token", items(n), |chunk| upstream.write(chunk), &cancel)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let sizes = upstream.sizes();
            prop_assert_eq!(sizes.len(), (n as usize).div_ceil(chunk_size));
            if let Some((last, full)) = sizes.split_last() {
                prop_assert!(full.iter().all(|&s| s == chunk_size));
                prop_assert!(*last >= 1 && *last <= chunk_size);
            }
            prop_assert_eq!(upstream.flattened(), items(n));
            prop_assert_eq!(outcome.items, items(n));
            prop_assert_eq!(invalidator.count(), usize::from(n > 0));
            Ok::<(), TestCaseError>(())
        })?;
    }
}

// ============================================================================
// PROPERTY 5: FAIL FAST
// ============================================================================

#[tokio::test]
async fn test_second_chunk_rejected_returns_first_chunk() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream {
        reject_call: Some(2),
        ..Default::default()
    };
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", items(250), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.is_partial());
    assert_eq!(outcome.items, items(100));
    assert_eq!(outcome.chunks_dispatched, 2);
    assert_eq!(outcome.chunks_total, 3);
    assert!(outcome.error.is_none());
    assert_eq!(upstream.sizes(), vec![100, 100]);
    assert_eq!(invalidator.count(), 1);
}

#[tokio::test]
async fn test_second_chunk_error_is_carried_in_outcome() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream {
        error_call: Some(2),
        ..Default::default()
    };
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", items(250), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.items.len(), 100);
    assert!(matches!(outcome.error, Some(RaindropError::Upstream(_))));
    assert_eq!(upstream.sizes().len(), 2);
    assert_eq!(invalidator.count(), 1);
}

#[tokio::test]
async fn test_first_chunk_failure_does_not_invalidate() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream {
        error_call: Some(1),
        ..Default::default()
    };
    let cancel = CancellationToken::new();

    let outcome = pipeline(invalidator.clone())
        .execute("token", items(150), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert!(outcome.items.is_empty());
    assert_eq!(upstream.sizes(), vec![100]);
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn test_partial_write_invalidates_real_cache() {
    let cache = Arc::new(ResponseCache::default());
    let cancel = CancellationToken::new();
    cache
        .collections(
            "token",
            || async { Ok(ItemsResponse::ok(vec![Collection::default()])) },
            &cancel,
        )
        .await
        .unwrap();

    let upstream = Upstream {
        reject_call: Some(2),
        ..Default::default()
    };
    let pipeline =
        BulkWritePipeline::new(DEFAULT_CHUNK_SIZE, EntityKind::Collections, cache.clone()).unwrap();
    let outcome = pipeline
        .execute("token", items(150), |chunk| upstream.write(chunk), &cancel)
        .await
        .unwrap();

    assert!(outcome.is_partial());
    let stats = cache.stats(EntityKind::Collections);
    assert_eq!(stats.invalidations, 1);
    assert_eq!(stats.entry_count, 0);
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test]
async fn test_cancel_between_chunks_stops_and_invalidates() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();

    let result = pipeline(invalidator.clone())
        .execute(
            "token",
            items(250),
            |chunk| {
                let write = upstream.write(chunk);
                let cancel = cancel.clone();
                async move {
                    let response = write.await;
                    cancel.cancel();
                    response
                }
            },
            &cancel,
        )
        .await;

    assert!(matches!(result, Err(RaindropError::Cancelled)));
    assert_eq!(upstream.sizes(), vec![100]);
    assert_eq!(invalidator.count(), 1);
}

#[tokio::test]
async fn test_pre_cancelled_run_makes_no_calls() {
    let invalidator = Arc::new(CountingInvalidator::default());
    let upstream = Upstream::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline(invalidator.clone())
        .execute("token", items(10), |chunk| upstream.write(chunk), &cancel)
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert!(upstream.sizes().is_empty());
    assert_eq!(invalidator.count(), 0);
}
