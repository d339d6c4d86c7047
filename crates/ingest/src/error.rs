//! Error types produced by upload validation.
//!
//! Every variant is a client error: the caller sent something the gateway will
//! not forward to the recognizer. The `Display` text is the message returned
//! to clients, so it names the supported formats or the violated limit.
//!
//! # HTTP Status Code Mapping
//!
//! | Error | Status |
//! |-------|--------|
//! | [`InvalidType`](IngestError::InvalidType) | 415 |
//! | [`BadSignature`](IngestError::BadSignature) | 415 |
//! | [`TooLarge`](IngestError::TooLarge) | 413 |
//! | [`Empty`](IngestError::Empty) | 400 |
//! | [`Corrupt`](IngestError::Corrupt) | 400 |
//! | [`BatchTooLarge`](IngestError::BatchTooLarge) | 400 |

use thiserror::Error;

use crate::types::ValidationVerdict;

/// Validation failure for a single upload or a whole batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Neither the declared content type nor the filename names a supported format.
    #[error("Unsupported file type. Supported formats: {supported}")]
    InvalidType { supported: String },

    /// Upload exceeds the per-file limit.
    #[error("File too large. Maximum size is {limit_mb}MB.")]
    TooLarge { size: usize, limit_mb: usize },

    /// Zero-byte upload.
    #[error("Empty file uploaded.")]
    Empty,

    /// Leading bytes match none of the known image signatures.
    #[error("Invalid image file. File content does not match image format.")]
    BadSignature,

    /// Signature matched but the image failed to decode. `reason` comes from
    /// the decoder and is kept for logs only.
    #[error("Corrupted or invalid image file.")]
    Corrupt { reason: String },

    /// More submissions than a batch may carry.
    #[error("Maximum {limit} images per batch request.")]
    BatchTooLarge { count: usize, limit: usize },
}

impl IngestError {
    /// Verdict tag for per-file failures; `None` for batch-level errors.
    pub fn verdict(&self) -> Option<ValidationVerdict> {
        match self {
            IngestError::InvalidType { .. } => Some(ValidationVerdict::InvalidType),
            IngestError::TooLarge { .. } => Some(ValidationVerdict::TooLarge),
            IngestError::Empty => Some(ValidationVerdict::Empty),
            IngestError::BadSignature => Some(ValidationVerdict::BadSignature),
            IngestError::Corrupt { .. } => Some(ValidationVerdict::Corrupt),
            IngestError::BatchTooLarge { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages() {
        let err = IngestError::InvalidType {
            supported: "JPG, PNG, GIF".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported file type. Supported formats: JPG, PNG, GIF"
        );
        assert_eq!(
            IngestError::TooLarge {
                size: 11 * 1024 * 1024,
                limit_mb: 10
            }
            .to_string(),
            "File too large. Maximum size is 10MB."
        );
        assert_eq!(IngestError::Empty.to_string(), "Empty file uploaded.");
        assert_eq!(
            IngestError::BadSignature.to_string(),
            "Invalid image file. File content does not match image format."
        );
        assert_eq!(
            IngestError::BatchTooLarge { count: 11, limit: 10 }.to_string(),
            "Maximum 10 images per batch request."
        );
    }

    #[test]
    fn corrupt_hides_decoder_detail() {
        let err = IngestError::Corrupt {
            reason: "unexpected end of file".into(),
        };
        assert_eq!(err.to_string(), "Corrupted or invalid image file.");
    }

    #[test]
    fn verdict_mapping() {
        assert_eq!(IngestError::Empty.verdict(), Some(ValidationVerdict::Empty));
        assert_eq!(
            IngestError::BadSignature.verdict(),
            Some(ValidationVerdict::BadSignature)
        );
        assert_eq!(
            IngestError::BatchTooLarge { count: 11, limit: 10 }.verdict(),
            None
        );
    }
}
