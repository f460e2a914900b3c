pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::Predictor;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub started_at: DateTime<Utc>,
    /// Directory served under /static/images, if any
    pub static_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Expose /metrics and record HTTP metrics
    pub metrics_enabled: bool,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self {
            predictor,
            started_at: Utc::now(),
            static_dir: None,
            request_timeout_secs: 30,
            metrics_enabled: true,
        }
    }

    /// Serve generated chart images from this directory
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
