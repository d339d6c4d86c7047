use thiserror::Error;

/// Failures of the external OCR collaborator.
///
/// The core never retries these; a single failed call fails the item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizerError {
    /// Configuration is inconsistent (e.g., Vision mode without credentials).
    #[error("invalid recognizer config: {0}")]
    InvalidConfig(String),
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("request to OCR service failed: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("OCR service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The service answered 200 but reported an error for the image.
    #[error("Vision API error: {0}")]
    Service(String),
    /// The response body did not have the expected shape.
    #[error("malformed OCR response: {0}")]
    Malformed(String),
}
