//! ocrgate ingest layer.
//!
//! This is where uploads enter the pipeline. Nothing reaches the recognizer
//! until it has passed the checks here.
//!
//! ## Check order
//!
//! The validator runs five checks and stops at the first failure:
//!
//! 1. **Type** - declared content type or filename extension is JPEG/PNG/GIF
//! 2. **Size** - at most 10 MiB
//! 3. **Emptiness** - at least one byte
//! 4. **Signature** - magic bytes of a supported format
//! 5. **Integrity** - the image actually decodes
//!
//! The order is part of the contract. A `.txt` upload holding truncated PNG
//! bytes is `InvalidType`, not `Corrupt`, and clients rely on that precedence
//! staying put.
//!
//! ## Example
//!
//! ```
//! use ingest::{validate, IngestConfig, Submission, ValidationVerdict};
//!
//! let cfg = IngestConfig::default();
//! let upload = Submission::new(Vec::new(), Some("image/png"), Some("blank.png"));
//! assert_eq!(validate(&upload, &cfg), ValidationVerdict::Empty);
//!
//! let wrong_type = Submission::new(b"\x89PNG".to_vec(), Some("text/plain"), Some("a.txt"));
//! assert_eq!(validate(&wrong_type, &cfg), ValidationVerdict::InvalidType);
//! ```
use std::time::Instant;

use tracing::{debug, warn};

mod config;
mod error;
mod metadata;
mod payload;
mod types;

pub use crate::config::{ConfigError, FormatSpec, IngestConfig, MAX_BATCH_SIZE, MAX_FILE_SIZE};
pub use crate::error::IngestError;
pub use crate::metadata::{extract_metadata, ImageMetadata};
pub use crate::payload::{check_integrity, check_signature};
pub use crate::types::{ImageFormat, Submission, ValidationVerdict};

/// Run the ordered checks and return the verdict tag.
pub fn validate(submission: &Submission, cfg: &IngestConfig) -> ValidationVerdict {
    match check(submission, cfg) {
        Ok(_) => ValidationVerdict::Valid,
        Err(err) => err.verdict().unwrap_or(ValidationVerdict::InvalidType),
    }
}

/// Run the ordered checks, returning the detected format or the first failure.
pub fn check(submission: &Submission, cfg: &IngestConfig) -> Result<ImageFormat, IngestError> {
    let start = Instant::now();
    match check_inner(submission, cfg) {
        Ok(format) => {
            debug!(
                filename = ?submission.filename(),
                format = %format,
                size = submission.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "validation_passed"
            );
            Ok(format)
        }
        Err(err) => {
            let detail = match &err {
                IngestError::Corrupt { reason } => reason.as_str(),
                _ => "",
            };
            warn!(
                filename = ?submission.filename(),
                content_type = ?submission.content_type(),
                size = submission.len(),
                error = %err,
                detail,
                elapsed_micros = start.elapsed().as_micros(),
                "validation_failed"
            );
            Err(err)
        }
    }
}

fn check_inner(submission: &Submission, cfg: &IngestConfig) -> Result<ImageFormat, IngestError> {
    if !cfg.accepts_declared_type(submission.content_type(), submission.filename()) {
        return Err(IngestError::InvalidType {
            supported: cfg.supported_formats_label(),
        });
    }

    let size = submission.len();
    if size > cfg.max_file_bytes {
        return Err(IngestError::TooLarge {
            size,
            limit_mb: cfg.max_file_megabytes(),
        });
    }

    if size == 0 {
        return Err(IngestError::Empty);
    }

    let format = check_signature(submission.bytes(), cfg)?;
    check_integrity(submission.bytes(), format)?;
    Ok(format)
}

/// Reject a batch that carries more submissions than allowed.
pub fn check_batch_size(count: usize, cfg: &IngestConfig) -> Result<(), IngestError> {
    if count > cfg.max_batch_size {
        warn!(count, limit = cfg.max_batch_size, "batch_too_large");
        return Err(IngestError::BatchTooLarge {
            count,
            limit: cfg.max_batch_size,
        });
    }
    Ok(())
}
