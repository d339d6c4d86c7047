//! OCR endpoints: `POST /extract-text` and `POST /extract-text/batch`.

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use ingest::{ImageMetadata, IngestError, Submission};
use ocrgate::{ItemOutcome, ItemResult, OcrResult, PipelineError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Query parameters shared by both endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ExtractQuery {
    /// Attach format, dimensions and EXIF fields to each result
    #[serde(default)]
    pub include_metadata: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub text: String,
    pub confidence: f64,
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchItemResponse {
    pub index: usize,
    pub filename: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Always true; per-item failures are reported in `results`.
    pub success: bool,
    pub total: usize,
    pub processed: usize,
    pub results: Vec<BatchItemResponse>,
    pub processing_time_ms: u64,
}

/// Extract text from one uploaded image.
///
/// Multipart field `image`. Validation failures map to 4xx, OCR failures
/// to 500.
pub async fn extract_text(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ExtractQuery>,
    mut multipart: Multipart,
) -> ServerResult<Json<ExtractResponse>> {
    let start = Instant::now();

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") || upload.is_some() {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        upload = Some(Submission::new(bytes, content_type, filename));
    }
    let upload = upload.ok_or(ServerError::MissingField("image"))?;

    tracing::info!(
        filename = ?upload.filename(),
        size = upload.len(),
        "extract_text"
    );

    let extraction = state
        .pipeline
        .extract(&upload, query.include_metadata)
        .await
        .inspect_err(record_failure)?;
    record_result(&extraction.result);

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(processing_time_ms, "Request completed");

    let OcrResult {
        text,
        confidence,
        cached,
        ..
    } = extraction.result;
    let message = text.is_empty().then(|| ocrgate::NO_TEXT_MESSAGE.to_string());
    Ok(Json(ExtractResponse {
        success: true,
        text,
        confidence,
        processing_time_ms,
        cached: cached.then_some(true),
        message,
        metadata: extraction.metadata,
    }))
}

/// Extract text from up to ten images.
///
/// Multipart fields `images`. A batch over the limit is rejected as a whole;
/// otherwise every item gets its own success or error entry, in upload order.
pub async fn extract_text_batch(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ExtractQuery>,
    mut multipart: Multipart,
) -> ServerResult<Json<BatchResponse>> {
    let start = Instant::now();
    let limit = state.pipeline.config().max_batch_size;

    let mut uploads = Vec::new();
    let mut count = 0usize;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("images") {
            continue;
        }
        count += 1;
        // Past the limit the request fails anyway; only keep counting.
        if count > limit {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        uploads.push(Submission::new(bytes, content_type, filename));
    }

    if count == 0 {
        return Err(ServerError::MissingField("images"));
    }
    if count > limit {
        tracing::warn!(count, limit, "batch_too_large");
        return Err(IngestError::BatchTooLarge { count, limit }.into());
    }

    tracing::info!(total = count, "extract_text_batch");
    let options = state.batch_options(query.include_metadata);
    let batch = state.pipeline.process_batch(uploads, &options).await?;

    let results: Vec<BatchItemResponse> = batch.items.into_iter().map(item_response).collect();
    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        processed = batch.succeeded,
        total = batch.total,
        processing_time_ms,
        "Batch completed"
    );

    Ok(Json(BatchResponse {
        success: true,
        total: batch.total,
        processed: batch.succeeded,
        results,
        processing_time_ms,
    }))
}

fn item_response(item: ItemResult) -> BatchItemResponse {
    let ItemResult {
        index,
        filename,
        outcome,
    } = item;
    match outcome {
        ItemOutcome::Success { result, metadata } => {
            record_result(&result);
            let message = result.message().map(str::to_owned);
            BatchItemResponse {
                index,
                filename,
                success: true,
                cached: result.cached.then_some(true),
                confidence: Some(result.confidence),
                text: Some(result.text),
                message,
                error: None,
                metadata,
            }
        }
        ItemOutcome::Failure { error } => {
            record_failure(&error);
            BatchItemResponse {
                index,
                filename,
                success: false,
                text: None,
                confidence: None,
                cached: None,
                message: None,
                error: Some(error.to_string()),
                metadata: None,
            }
        }
    }
}

fn record_result(result: &OcrResult) {
    let name = if result.cached {
        "ocrgate_cache_hits_total"
    } else {
        "ocrgate_cache_misses_total"
    };
    metrics::counter!(name).increment(1);
}

fn record_failure(err: &PipelineError) {
    match err {
        PipelineError::Validation(_) => {
            metrics::counter!("ocrgate_validation_failures_total").increment(1)
        }
        PipelineError::Recognition(_) => {
            metrics::counter!("ocrgate_ocr_failures_total").increment(1)
        }
    }
}
