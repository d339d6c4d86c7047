//! API route handlers
//!
//! - `health`: service status and Prometheus metrics
//! - `extract`: OCR on a single upload or a batch

pub mod extract;
pub mod health;

use crate::error::ServerError;

/// 404 Not Found handler
///
/// Returns the uniform error envelope for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
