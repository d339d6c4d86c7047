//! Validation limits and the supported-format table.
//!
//! The gateway runs with fixed limits: JPEG/PNG/GIF only, 10 MiB per file and
//! 10 files per batch. [`IngestConfig::default`] carries exactly those values
//! and the server never overrides them per request. The struct exists so the
//! limits live in one place and tests can shrink them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ImageFormat;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Largest accepted batch, in items.
pub const MAX_BATCH_SIZE: usize = 10;

/// One accepted format: the MIME type and filename extensions that declare it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub format: ImageFormat,
    pub mime: String,
    /// Lowercase, with the leading dot.
    pub extensions: Vec<String>,
}

impl FormatSpec {
    fn new(format: ImageFormat, mime: &str, extensions: &[&str]) -> Self {
        Self {
            format,
            mime: mime.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    /// True when the declared content type or the filename names this format.
    pub fn is_declared_by(&self, content_type: Option<&str>, filename: Option<&str>) -> bool {
        if let Some(content_type) = content_type {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if essence == self.mime {
                return true;
            }
        }
        if let Some(filename) = filename {
            let lower = filename.to_ascii_lowercase();
            if self.extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
                return true;
            }
        }
        false
    }
}

/// Runtime limits for upload validation.
///
/// # Examples
///
/// ```rust
/// use ingest::{IngestConfig, MAX_BATCH_SIZE, MAX_FILE_SIZE};
///
/// let cfg = IngestConfig::default();
/// assert_eq!(cfg.max_file_bytes, MAX_FILE_SIZE);
/// assert_eq!(cfg.max_batch_size, MAX_BATCH_SIZE);
/// assert_eq!(cfg.supported_formats_label(), "JPG, PNG, GIF");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Accepted formats, in the order they are listed to clients.
    pub formats: Vec<FormatSpec>,

    /// Maximum upload size in bytes.
    ///
    /// Default: [`MAX_FILE_SIZE`]
    pub max_file_bytes: usize,

    /// Maximum number of submissions in one batch.
    ///
    /// Default: [`MAX_BATCH_SIZE`]
    pub max_batch_size: usize,
}

/// Misconfigured limits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("at least one supported format is required")]
    NoFormats,

    #[error("max_file_bytes must be greater than zero")]
    ZeroFileLimit,

    #[error("max_batch_size must be greater than zero")]
    ZeroBatchLimit,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            formats: vec![
                FormatSpec::new(ImageFormat::Jpeg, "image/jpeg", &[".jpg", ".jpeg"]),
                FormatSpec::new(ImageFormat::Png, "image/png", &[".png"]),
                FormatSpec::new(ImageFormat::Gif, "image/gif", &[".gif"]),
            ],
            max_file_bytes: MAX_FILE_SIZE,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.formats.is_empty() {
            return Err(ConfigError::NoFormats);
        }
        if self.max_file_bytes == 0 {
            return Err(ConfigError::ZeroFileLimit);
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(())
    }

    /// Human-readable list such as `"JPG, PNG, GIF"`.
    pub fn supported_formats_label(&self) -> String {
        self.formats
            .iter()
            .map(|spec| spec.format.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the declared content type or filename names an accepted format.
    pub fn accepts_declared_type(&self, content_type: Option<&str>, filename: Option<&str>) -> bool {
        self.formats
            .iter()
            .any(|spec| spec.is_declared_by(content_type, filename))
    }

    /// Whether magic bytes of `format` may pass the signature check.
    pub fn accepts_format(&self, format: ImageFormat) -> bool {
        self.formats.iter().any(|spec| spec.format == format)
    }

    /// The file limit rendered in whole megabytes for client messages.
    pub fn max_file_megabytes(&self) -> usize {
        self.max_file_bytes / (1024 * 1024)
    }
}
