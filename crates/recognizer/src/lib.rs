//! OCR collaborator boundary.
//!
//! The gateway does not recognize text itself. It hands validated image bytes
//! to an [`OcrEngine`] and takes back raw text plus a confidence score. Two
//! engines ship here:
//!
//! - [`VisionEngine`]: Google Cloud Vision `images:annotate` over HTTPS
//! - [`StubEngine`]: deterministic, in-process, counts its calls
//!
//! Engines make exactly one attempt per call. Retry policy, if any, belongs to
//! the service behind the engine.
//!
//! ## Quick start
//!
//! ```no_run
//! use recognizer::{build_engine, RecognizerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = RecognizerConfig {
//!         api_key: Some("AIza...".into()),
//!         ..Default::default()
//!     };
//!     let engine = build_engine(&cfg).expect("valid config");
//!     let image = std::fs::read("receipt.png").unwrap();
//!     let result = engine.recognize(&image).await.unwrap();
//!     println!("{} ({:.2})", result.text, result.confidence);
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod error;
mod stub;

pub use api::VisionEngine;
pub use config::{EngineMode, RecognizerConfig, VISION_ENDPOINT};
pub use error::RecognizerError;
pub use stub::StubEngine;

/// Raw recognizer output, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    /// Engine-reported confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Recognition {
    /// No text found.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }
}

/// An external OCR service.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Recognize text in one image. Single attempt, no retry.
    async fn recognize(&self, image: &[u8]) -> Result<Recognition, RecognizerError>;
}

/// Build the engine selected by `cfg.mode`.
pub fn build_engine(cfg: &RecognizerConfig) -> Result<Arc<dyn OcrEngine>, RecognizerError> {
    let engine: Arc<dyn OcrEngine> = match cfg.mode {
        EngineMode::Vision => Arc::new(VisionEngine::new(cfg)?),
        EngineMode::Stub => Arc::new(StubEngine::default()),
    };
    info!(engine = engine.name(), "ocr_engine_ready");
    Ok(engine)
}
