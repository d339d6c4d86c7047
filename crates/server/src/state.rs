use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use ocrgate::{BatchOptions, OcrEngine, Pipeline, ResultCache};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Tracked (client, route) pairs above which expired windows are swept.
const RATE_LIMITER_SWEEP_THRESHOLD: usize = 10_000;

/// Rate-limited route groups. Each has its own per-client budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Single,
    Batch,
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Validation, cache and OCR, shared across requests
    pub pipeline: Pipeline,

    /// Rate limit tracking: (client, route) -> (count, window_start)
    pub rate_limiter: Arc<DashMap<(String, RouteClass), (u32, Instant)>>,

    /// Prometheus render handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state with the engine selected by the config
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let engine = recognizer::build_engine(&config.recognizer)
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(Self::with_engine(config, engine))
    }

    /// Create new server state around an existing engine
    pub fn with_engine(config: ServerConfig, engine: Arc<dyn OcrEngine>) -> Self {
        let pipeline = Pipeline::new(engine, Arc::new(ResultCache::default()));
        Self {
            config: Arc::new(config),
            pipeline,
            rate_limiter: Arc::new(DashMap::new()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn batch_options(&self, include_metadata: bool) -> BatchOptions {
        BatchOptions {
            include_metadata,
            concurrency: self.config.batch_concurrency,
        }
    }

    fn limit_for(&self, class: RouteClass) -> u32 {
        match class {
            RouteClass::Single => self.config.single_rate_limit_per_minute,
            RouteClass::Batch => self.config.batch_rate_limit_per_minute,
        }
    }

    /// Fixed one-minute window per client and route class
    pub fn check_rate_limit(&self, client: &str, class: RouteClass) -> bool {
        let now = Instant::now();
        let limit = self.limit_for(class);

        // Must run before `entry` below takes a shard lock.
        if self.rate_limiter.len() > RATE_LIMITER_SWEEP_THRESHOLD {
            self.sweep_expired(now);
        }

        let mut entry = self
            .rate_limiter
            .entry((client.to_string(), class))
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > RATE_WINDOW {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }

    /// Drop every window that has run out. Such a client starts a fresh
    /// window on its next request anyway, so nothing observable changes.
    fn sweep_expired(&self, now: Instant) {
        let before = self.rate_limiter.len();
        self.rate_limiter
            .retain(|_, (_, window_start)| now.duration_since(*window_start) <= RATE_WINDOW);
        tracing::debug!(
            before,
            after = self.rate_limiter.len(),
            "rate_limiter_swept"
        );
    }
}
