//! Batch orchestration over [`Pipeline`].
//!
//! Items are independent: one bad upload never fails its neighbours. The only
//! batch-level failure is an oversized batch, which is rejected before any
//! item is looked at.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use ingest::{check_batch_size, ImageMetadata, Submission};
use serde::Serialize;
use tracing::{debug, info};

use crate::pipeline::{OcrResult, Pipeline};
use crate::PipelineError;

/// Default number of items processed at the same time.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub include_metadata: bool,
    /// Upper bound on items in flight. Zero is treated as one.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            include_metadata: false,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

/// Outcome of one item, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemResult {
    /// Zero-based position in the submitted batch.
    pub index: usize,
    pub filename: Option<String>,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Success {
        result: OcrResult,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<ImageMetadata>,
    },
    Failure {
        error: PipelineError,
    },
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    /// Items that produced an [`OcrResult`], including empty-text ones.
    pub succeeded: usize,
    pub items: Vec<ItemResult>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

impl Pipeline {
    /// Process every submission and report per-item outcomes in input order.
    ///
    /// Fails as a whole only when the batch exceeds the configured size; in
    /// that case no item is validated and the engine is never called.
    pub async fn process_batch(
        &self,
        submissions: Vec<Submission>,
        options: &BatchOptions,
    ) -> Result<BatchResult, PipelineError> {
        let start = Instant::now();
        let total = submissions.len();
        check_batch_size(total, self.config())?;

        let concurrency = options.concurrency.max(1);
        let include_metadata = options.include_metadata;
        debug!(total, concurrency, "batch_started");

        let mut items: Vec<ItemResult> = stream::iter(submissions.into_iter().enumerate())
            .map(|(index, submission)| async move {
                let outcome = match self.extract(&submission, include_metadata).await {
                    Ok(extraction) => ItemOutcome::Success {
                        result: extraction.result,
                        metadata: extraction.metadata,
                    },
                    Err(error) => ItemOutcome::Failure { error },
                };
                ItemResult {
                    index,
                    filename: submission.filename().map(str::to_owned),
                    outcome,
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        items.sort_by_key(|item| item.index);

        let succeeded = items.iter().filter(|item| item.is_success()).count();
        let elapsed = start.elapsed();
        info!(
            total,
            succeeded,
            failed = total - succeeded,
            elapsed_ms = elapsed.as_millis() as u64,
            "batch_completed"
        );
        Ok(BatchResult {
            total,
            succeeded,
            items,
            elapsed,
        })
    }
}
