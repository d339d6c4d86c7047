//! ocrgate: an image-to-text gateway.
//!
//! The umbrella crate ties the stages together so callers get one entry point:
//!
//! ```text
//! Submission -> ingest::check -> canonical::fingerprint -> ResultCache
//!                                                            | miss
//!                                                            v
//!                                         OcrEngine -> canonical::normalize_text
//! ```
//!
//! [`Pipeline::process`] handles one upload, [`Pipeline::process_batch`]
//! fans a batch out over the same pipeline and reports per-item outcomes in
//! input order. The HTTP surface lives in the `ocrgate-server` crate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ocrgate::{Pipeline, ResultCache, StubEngine, Submission};
//!
//! # async fn run() -> Result<(), ocrgate::PipelineError> {
//! let pipeline = Pipeline::new(
//!     Arc::new(StubEngine::new("Hello", 0.93)),
//!     Arc::new(ResultCache::default()),
//! );
//! let png = std::fs::read("scan.png").unwrap_or_default();
//! let upload = Submission::new(png, Some("image/png"), Some("scan.png"));
//! let result = pipeline.process(&upload).await?;
//! println!("{} (cached: {})", result.text, result.cached);
//! # Ok(())
//! # }
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;

mod batch;
mod cache;
mod pipeline;

pub use batch::{BatchOptions, BatchResult, ItemOutcome, ItemResult, DEFAULT_BATCH_CONCURRENCY};
pub use cache::{CacheEntry, ResultCache, CACHE_CAPACITY};
pub use pipeline::{Extraction, OcrResult, Pipeline, NO_TEXT_MESSAGE};

pub use canonical::{fingerprint, normalize_text, Fingerprint, FINGERPRINT_HEX_LEN};
pub use ingest::{
    check, check_batch_size, extract_metadata, validate, ImageFormat, ImageMetadata, IngestConfig,
    IngestError, Submission, ValidationVerdict, MAX_BATCH_SIZE, MAX_FILE_SIZE,
};
pub use recognizer::{
    build_engine, EngineMode, OcrEngine, Recognition, RecognizerConfig, RecognizerError,
    StubEngine, VisionEngine,
};

/// Why an upload (or a whole batch) produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Rejected before the engine was called.
    #[error(transparent)]
    Validation(#[from] IngestError),
    /// The engine was called once and failed.
    #[error("OCR processing failed: {0}")]
    Recognition(#[from] RecognizerError),
}

impl PipelineError {
    /// True for failures caused by the upload itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

impl Serialize for PipelineError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
