//! Core data types for uploads entering the OCR pipeline.
//!
//! - [`Submission`]: raw upload bytes plus the metadata the client declared
//! - [`ImageFormat`]: the formats the gateway accepts, with their magic bytes
//! - [`ValidationVerdict`]: the single outcome of running the validator

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One uploaded image as received from the transport layer.
///
/// Immutable once built. The pipeline invocation that creates a submission
/// owns it and drops it when the item is done.
///
/// # Examples
///
/// ```rust
/// use ingest::Submission;
///
/// let sub = Submission::new(vec![0xFF, 0xD8, 0xFF], Some("image/jpeg"), Some("scan.jpg"));
/// assert_eq!(sub.len(), 3);
/// assert_eq!(sub.filename(), Some("scan.jpg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    bytes: Bytes,
    content_type: Option<String>,
    filename: Option<String>,
}

impl Submission {
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: Option<impl Into<String>>,
        filename: Option<impl Into<String>>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.map(Into::into),
            filename: filename.map(Into::into),
        }
    }

    /// Raw upload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content type declared by the client, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Client-side filename, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Image formats the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

    /// Magic-byte prefixes identifying this format.
    pub fn signatures(self) -> &'static [&'static [u8]] {
        match self {
            ImageFormat::Jpeg => &[b"\xFF\xD8\xFF"],
            ImageFormat::Png => &[b"\x89PNG\r\n\x1A\n"],
            ImageFormat::Gif => &[b"GIF87a", b"GIF89a"],
        }
    }

    /// Short label used in client-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
        }
    }

    /// Identify a format from the leading bytes of a file.
    pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
        Self::ALL.into_iter().find(|format| {
            format
                .signatures()
                .iter()
                .any(|signature| bytes.starts_with(signature))
        })
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of validating one submission.
///
/// Exactly one tag per submission. Checks run in a fixed order and the first
/// failing check decides the tag; see [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationVerdict {
    Valid,
    InvalidType,
    TooLarge,
    Empty,
    BadSignature,
    Corrupt,
}

impl ValidationVerdict {
    pub fn is_valid(self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }
}
