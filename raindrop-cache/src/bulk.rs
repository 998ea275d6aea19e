//! Chunked bulk writes with fail-fast semantics.
//!
//! A large batch is split into fixed-size chunks sent one at a time, in
//! input order. The first chunk that fails stops the run; everything written
//! up to that point is returned as a partial result. Whenever at least one
//! item was written the caller's cached reads of the target kind are
//! invalidated, even if a later chunk failed.

use crate::cache::CacheInvalidator;
use raindrop_core::{
    EntityKind, ItemsResponse, RaindropError, RaindropResult, ValidationError,
    DEFAULT_BULK_CHUNK_SIZE,
};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Largest batch accepted by the upstream create-many endpoint.
pub const DEFAULT_CHUNK_SIZE: usize = DEFAULT_BULK_CHUNK_SIZE;

/// Result of a chunked bulk write.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteOutcome<T> {
    /// False as soon as any chunk failed.
    pub ok: bool,
    /// Items returned by the chunks that succeeded, in input order.
    pub items: Vec<T>,
    /// Number of upstream calls made.
    pub chunks_dispatched: usize,
    /// Number of chunks the input was split into.
    pub chunks_total: usize,
    /// The error raised by the failing chunk, when it raised one rather than
    /// answering with a not-ok response.
    pub error: Option<RaindropError>,
}

impl<T> BulkWriteOutcome<T> {
    fn empty(chunks_total: usize, capacity: usize) -> Self {
        Self {
            ok: true,
            items: Vec::with_capacity(capacity),
            chunks_dispatched: 0,
            chunks_total,
            error: None,
        }
    }

    /// True when some chunks were written before a failure.
    pub fn is_partial(&self) -> bool {
        !self.ok && !self.items.is_empty()
    }

    /// The outcome in the upstream envelope shape.
    pub fn into_response(self) -> ItemsResponse<T> {
        ItemsResponse {
            result: self.ok,
            items: Some(self.items),
        }
    }
}

/// Splits bulk writes into chunks and invalidates the cache afterwards.
pub struct BulkWritePipeline {
    chunk_size: usize,
    kind: EntityKind,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl BulkWritePipeline {
    /// Create a pipeline that invalidates `kind` after a write.
    ///
    /// A chunk size of zero is rejected.
    pub fn new(
        chunk_size: usize,
        kind: EntityKind,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> RaindropResult<Self> {
        if chunk_size == 0 {
            return Err(ValidationError::OutOfRange {
                field: "chunk_size".to_string(),
                value: 0,
                min: 1,
                max: DEFAULT_CHUNK_SIZE as i64,
            }
            .into());
        }
        Ok(Self {
            chunk_size,
            kind,
            invalidator,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Send `items` upstream in chunks, stopping at the first failure.
    ///
    /// `upstream_write` receives each chunk in order and is never called for
    /// an empty input. A chunk fails when it raises an error or answers with
    /// a not-ok response; its items are not added to the outcome.
    ///
    /// Cancellation stops the run before the next chunk (or abandons the one
    /// in flight) and returns [`RaindropError::Cancelled`]. Items already
    /// written still trigger invalidation.
    pub async fn execute<P, T, F, Fut>(
        &self,
        raw_credential: &str,
        items: Vec<P>,
        mut upstream_write: F,
        cancel: &CancellationToken,
    ) -> RaindropResult<BulkWriteOutcome<T>>
    where
        F: FnMut(Vec<P>) -> Fut,
        Fut: Future<Output = RaindropResult<ItemsResponse<T>>>,
    {
        let chunks_total = items.len().div_ceil(self.chunk_size);
        let mut outcome = BulkWriteOutcome::empty(chunks_total, items.len());
        if items.is_empty() {
            return Ok(outcome);
        }

        let mut remaining = items.into_iter();
        let run: RaindropResult<()> = loop {
            let chunk: Vec<P> = remaining.by_ref().take(self.chunk_size).collect();
            if chunk.is_empty() {
                break Ok(());
            }
            if cancel.is_cancelled() {
                break Err(RaindropError::Cancelled);
            }

            outcome.chunks_dispatched += 1;
            let index = outcome.chunks_dispatched;
            let size = chunk.len();
            tracing::debug!(entity = %self.kind, chunk = index, of = chunks_total, size, "dispatching bulk chunk");

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(RaindropError::Cancelled),
                response = upstream_write(chunk) => response,
            };

            match response {
                Ok(response) if response.is_ok() => outcome.items.extend(response.into_items()),
                Ok(_) => {
                    tracing::warn!(entity = %self.kind, chunk = index, of = chunks_total, "bulk chunk rejected upstream, stopping");
                    outcome.ok = false;
                    break Ok(());
                }
                Err(e) => {
                    tracing::warn!(entity = %self.kind, chunk = index, of = chunks_total, error = %e, "bulk chunk failed, stopping");
                    outcome.ok = false;
                    outcome.error = Some(e);
                    break Ok(());
                }
            }
        };

        if !outcome.items.is_empty() {
            self.invalidator
                .invalidate_entity_type(self.kind, raw_credential);
        }

        run.map(|()| outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingInvalidator {
        calls: Mutex<Vec<(EntityKind, String)>>,
    }

    impl CacheInvalidator for RecordingInvalidator {
        fn invalidate_entity_type(&self, kind: EntityKind, raw_credential: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((kind, raw_credential.to_string()));
        }

        fn invalidate_all(&self, raw_credential: &str) {
            for kind in EntityKind::ALL {
                self.invalidate_entity_type(kind, raw_credential);
            }
        }
    }

    fn pipeline(invalidator: &Arc<RecordingInvalidator>) -> BulkWritePipeline {
        BulkWritePipeline::new(DEFAULT_CHUNK_SIZE, EntityKind::Collections, invalidator.clone())
            .unwrap()
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let result = BulkWritePipeline::new(0, EntityKind::Collections, invalidator);
        assert!(matches!(result, Err(RaindropError::Validation(_))));
    }

    #[tokio::test]
    async fn test_single_chunk_below_limit() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let cancel = CancellationToken::new();
        let items: Vec<u32> = (0..50).collect();

        let outcome = pipeline(&invalidator)
            .execute(
                "token",
                items,
                |chunk| async move { Ok(ItemsResponse::ok(chunk)) },
                &cancel,
            )
            .await
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(outcome.items.len(), 50);
        assert_eq!(outcome.chunks_dispatched, 1);
        assert_eq!(outcome.chunks_total, 1);
        assert_eq!(invalidator.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_ok_first_chunk_skips_invalidation() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let cancel = CancellationToken::new();

        let outcome = pipeline(&invalidator)
            .execute(
                "token",
                vec![1u32, 2, 3],
                |_chunk: Vec<u32>| async { Ok(ItemsResponse::<u32>::failed(vec![])) },
                &cancel,
            )
            .await
            .unwrap();

        assert!(!outcome.ok);
        assert!(outcome.items.is_empty());
        assert!(outcome.error.is_none());
        assert!(!outcome.is_partial());
        assert!(invalidator.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_into_response_carries_partial_items() {
        let outcome = BulkWriteOutcome {
            ok: false,
            items: vec![1, 2],
            chunks_dispatched: 2,
            chunks_total: 3,
            error: None,
        };
        assert!(outcome.is_partial());
        let response = outcome.into_response();
        assert!(!response.is_ok());
        assert_eq!(response.items(), &[1, 2]);
    }
}
