use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{OcrEngine, Recognition, RecognizerError};

type Handler = dyn Fn(&[u8]) -> Result<Recognition, RecognizerError> + Send + Sync;

/// Deterministic in-process engine used for offline runs and tests.
///
/// Every call goes through a handler closure and bumps a call counter, so
/// callers can assert exactly how often the collaborator was reached.
#[derive(Clone)]
pub struct StubEngine {
    handler: Arc<Handler>,
    calls: Arc<AtomicUsize>,
}

impl StubEngine {
    /// Always answers with `text` and `confidence`.
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        let reply = Recognition {
            text: text.into(),
            confidence,
        };
        Self::with_handler(move |_| Ok(reply.clone()))
    }

    /// Always fails with a service error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_handler(move |_| Err(RecognizerError::Service(message.clone())))
    }

    /// Answers through an arbitrary function of the image bytes.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Recognition, RecognizerError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `recognize` calls so far, shared across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubEngine {
    /// Finds no text in any image.
    fn default() -> Self {
        Self::with_handler(|_| Ok(Recognition::empty()))
    }
}

impl fmt::Debug for StubEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubEngine")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OcrEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn recognize(&self, image: &[u8]) -> Result<Recognition, RecognizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_reply_and_counter() {
        let engine = StubEngine::new("Hello", 0.5);
        let first = engine.recognize(b"a").await.unwrap();
        let second = engine.recognize(b"b").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.text, "Hello");
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn counter_shared_across_clones() {
        let engine = StubEngine::default();
        let clone = engine.clone();
        clone.recognize(b"x").await.unwrap();
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn failing_engine() {
        let engine = StubEngine::failing("quota exceeded");
        let err = engine.recognize(b"x").await.unwrap_err();
        assert_eq!(err, RecognizerError::Service("quota exceeded".into()));
    }

    #[tokio::test]
    async fn handler_sees_bytes() {
        let engine = StubEngine::with_handler(|bytes| {
            Ok(Recognition {
                text: format!("{} bytes", bytes.len()),
                confidence: 1.0,
            })
        });
        assert_eq!(engine.recognize(b"abcd").await.unwrap().text, "4 bytes");
    }

    #[tokio::test]
    async fn default_finds_nothing() {
        let result = StubEngine::default().recognize(b"img").await.unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 0.0);
    }
}
