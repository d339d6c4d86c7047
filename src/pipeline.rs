//! Single-image pipeline: validate, fingerprint, cache, recognize, normalize.

use std::sync::Arc;
use std::time::Instant;

use canonical::{fingerprint, normalize_text, Fingerprint};
use ingest::{check, extract_metadata, ImageMetadata, IngestConfig, Submission};
use recognizer::OcrEngine;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::PipelineError;

/// Advisory attached to results whose text is empty.
pub const NO_TEXT_MESSAGE: &str = "No text found in image";

/// Recognized text for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrResult {
    /// Normalized text; empty when nothing was recognized.
    pub text: String,
    /// Confidence rounded to four decimals.
    pub confidence: f64,
    /// True when served from the result cache.
    pub cached: bool,
    pub fingerprint: Fingerprint,
}

impl OcrResult {
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// `Some(NO_TEXT_MESSAGE)` for empty results.
    pub fn message(&self) -> Option<&'static str> {
        (!self.has_text()).then_some(NO_TEXT_MESSAGE)
    }
}

/// An [`OcrResult`] plus optional image metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub result: OcrResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

/// Composes the validator, fingerprinting, the shared cache and the OCR
/// collaborator.
///
/// Cheap to clone; clones share the engine and the cache.
#[derive(Clone)]
pub struct Pipeline {
    engine: Arc<dyn OcrEngine>,
    cache: Arc<ResultCache>,
    config: IngestConfig,
}

impl Pipeline {
    pub fn new(engine: Arc<dyn OcrEngine>, cache: Arc<ResultCache>) -> Self {
        Self {
            engine,
            cache,
            config: IngestConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Run one submission through the pipeline.
    ///
    /// Validation failures never reach the engine. A cache hit skips the
    /// engine entirely. A miss makes exactly one engine call; its failure is
    /// returned as is, without retry.
    pub async fn process(&self, submission: &Submission) -> Result<OcrResult, PipelineError> {
        let start = Instant::now();
        check(submission, &self.config)?;

        let key = fingerprint(submission.bytes());
        if let Some(entry) = self.cache.get(&key) {
            info!(fingerprint = %key.short(), "cache_hit");
            return Ok(OcrResult {
                text: entry.text,
                confidence: entry.confidence,
                cached: true,
                fingerprint: key,
            });
        }
        debug!(fingerprint = %key.short(), "cache_miss");

        let recognition = match self.engine.recognize(submission.bytes()).await {
            Ok(recognition) => recognition,
            Err(err) => {
                warn!(
                    engine = self.engine.name(),
                    fingerprint = %key.short(),
                    error = %err,
                    "recognition_failed"
                );
                return Err(err.into());
            }
        };

        let text = normalize_text(&recognition.text);
        let confidence = round_confidence(recognition.confidence);
        let entry = self.cache.put(key.clone(), text, confidence);

        info!(
            engine = self.engine.name(),
            fingerprint = %key.short(),
            chars = entry.text.chars().count(),
            confidence = entry.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "recognized"
        );
        Ok(OcrResult {
            text: entry.text,
            confidence: entry.confidence,
            cached: false,
            fingerprint: key,
        })
    }

    /// [`process`](Self::process), then optionally attach image metadata.
    ///
    /// Metadata extraction can only add information: when it fails the
    /// result is returned without metadata.
    pub async fn extract(
        &self,
        submission: &Submission,
        include_metadata: bool,
    ) -> Result<Extraction, PipelineError> {
        let result = self.process(submission).await?;
        let metadata = if include_metadata {
            extract_metadata(submission.bytes())
        } else {
            None
        };
        Ok(Extraction { result, metadata })
    }
}

/// Clamp to `[0, 1]` and round to four decimals.
fn round_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return 0.0;
    }
    (confidence.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}
