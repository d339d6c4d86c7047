//! Google Cloud Vision client.
//!
//! One `images:annotate` call per image, no retries. Text comes from
//! `fullTextAnnotation.text`; confidence is the mean of the strictly positive
//! block confidences across all pages.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{OcrEngine, Recognition, RecognizerConfig, RecognizerError};

/// Error bodies are clipped to this many bytes before they reach logs or clients.
const MAX_ERROR_BODY: usize = 512;

/// OCR engine backed by the Google Cloud Vision REST API.
#[derive(Debug, Clone)]
pub struct VisionEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    access_token: Option<String>,
    feature: String,
}

impl VisionEngine {
    pub fn new(cfg: &RecognizerConfig) -> Result<Self, RecognizerError> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| RecognizerError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            access_token: cfg.access_token.clone(),
            feature: cfg.feature.clone(),
        })
    }
}

#[async_trait]
impl OcrEngine for VisionEngine {
    fn name(&self) -> &'static str {
        "google-vision"
    }

    async fn recognize(&self, image: &[u8]) -> Result<Recognition, RecognizerError> {
        let start = Instant::now();
        let payload = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": self.feature }],
            }]
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        debug!(bytes = image.len(), "vision_request");
        let response = request
            .send()
            .await
            .map_err(|e| RecognizerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "vision_http_error");
            return Err(RecognizerError::Http {
                status: status.as_u16(),
                body: clip(&body),
            });
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| RecognizerError::Malformed(e.to_string()))?;
        let recognition = body.into_recognition()?;

        info!(
            chars = recognition.text.chars().count(),
            confidence = recognition.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "vision_recognized"
        );
        Ok(recognition)
    }
}

fn clip(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Default, Deserialize)]
struct Block {
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

impl AnnotateResponse {
    fn into_recognition(self) -> Result<Recognition, RecognizerError> {
        let first = self
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| RecognizerError::Malformed("no responses in annotate reply".into()))?;

        if let Some(status) = first.error {
            if !status.message.is_empty() {
                return Err(RecognizerError::Service(status.message));
            }
        }

        let annotation = match first.full_text_annotation {
            Some(annotation) if !annotation.text.is_empty() => annotation,
            _ => return Ok(Recognition::empty()),
        };

        let confidences: Vec<f64> = annotation
            .pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .map(|block| block.confidence)
            .filter(|confidence| *confidence > 0.0)
            .collect();
        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        Ok(Recognition {
            text: annotation.text,
            confidence,
        })
    }
}
