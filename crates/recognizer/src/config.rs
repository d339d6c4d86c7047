use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::RecognizerError;

/// Default Google Cloud Vision annotate endpoint.
pub const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Which collaborator answers recognition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Google Cloud Vision over HTTPS.
    #[default]
    Vision,
    /// Deterministic in-process stub; no network.
    Stub,
}

/// Runtime configuration for the OCR collaborator.
///
/// # Example
/// ```
/// use recognizer::{EngineMode, RecognizerConfig};
///
/// let cfg = RecognizerConfig {
///     api_key: Some("AIza-example".into()),
///     ..Default::default()
/// };
/// assert_eq!(cfg.mode, EngineMode::Vision);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Collaborator selector: `"vision"` (default) or `"stub"`.
    pub mode: EngineMode,
    /// Annotate endpoint; override for proxies or regional endpoints.
    pub endpoint: String,
    /// API key sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// OAuth access token sent as a bearer header, as an alternative to `api_key`.
    pub access_token: Option<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Vision feature type requested for every image.
    pub feature: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Vision,
            endpoint: VISION_ENDPOINT.to_string(),
            api_key: None,
            access_token: None,
            timeout_secs: 30,
            feature: "DOCUMENT_TEXT_DETECTION".to_string(),
        }
    }
}

impl RecognizerConfig {
    pub fn stub() -> Self {
        Self {
            mode: EngineMode::Stub,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), RecognizerError> {
        if self.mode == EngineMode::Stub {
            return Ok(());
        }
        if self.endpoint.trim().is_empty() {
            return Err(RecognizerError::InvalidConfig("endpoint is empty".into()));
        }
        if self.api_key.is_none() && self.access_token.is_none() {
            return Err(RecognizerError::InvalidConfig(
                "vision mode requires api_key or access_token".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(RecognizerError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
