use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingest::IngestError;
use ocrgate::PipelineError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Rate limit exceeded.")]
    RateLimitExceeded,

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing multipart field '{0}'.")]
    MissingField(&'static str),

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Metrics are disabled.")]
    MetricsDisabled,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// Uniform error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub status_code: u16,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) | ServerError::MissingField(_) => StatusCode::BAD_REQUEST,
            ServerError::Multipart { status, .. } => *status,
            ServerError::Pipeline(err) => pipeline_status(err),
            ServerError::NotFound | ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for this error
    fn kind(&self) -> &'static str {
        match self {
            ServerError::RateLimitExceeded => "rate_limited",
            ServerError::BadRequest(_) | ServerError::MissingField(_) => "bad_request",
            ServerError::Multipart { .. } => "multipart",
            ServerError::Pipeline(PipelineError::Validation(_)) => "validation",
            ServerError::Pipeline(PipelineError::Recognition(_)) => "recognition",
            ServerError::MetricsDisabled | ServerError::NotFound => "not_found",
            ServerError::Internal(_) => "internal",
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Validation(IngestError::InvalidType { .. })
        | PipelineError::Validation(IngestError::BadSignature) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        PipelineError::Validation(IngestError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        PipelineError::Validation(IngestError::Empty)
        | PipelineError::Validation(IngestError::Corrupt { .. })
        | PipelineError::Validation(IngestError::BatchTooLarge { .. }) => StatusCode::BAD_REQUEST,
        PipelineError::Recognition(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request_failed");
        }
        metrics::counter!("ocrgate_errors_total", "kind" => self.kind()).increment(1);

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
            status_code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        ServerError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<IngestError> for ServerError {
    fn from(err: IngestError) -> Self {
        ServerError::Pipeline(err.into())
    }
}
