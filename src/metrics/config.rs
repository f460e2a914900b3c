/// Configuration for Prometheus metrics collection

use serde::{Deserialize, Serialize};

/// Configuration for metrics collection and export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics collection
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Enable histogram metrics
    #[serde(default = "default_enable_histograms")]
    pub enable_histograms: bool,

    /// Paths to exclude from HTTP metrics
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            enable_histograms: default_enable_histograms(),
            excluded_paths: vec!["/health".to_string(), "/metrics".to_string()],
        }
    }
}

impl MetricsConfig {
    /// Create a configuration with metrics disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Exclude a path from HTTP metrics
    pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
        self.excluded_paths.push(path.into());
        self
    }

    /// Check if a path should be excluded from metrics
    pub fn is_path_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|excluded| {
            // Support exact match and prefix match
            path == excluded || path.starts_with(&format!("{}/", excluded))
        })
    }
}

// Default value functions for serde
fn default_enabled() -> bool {
    true
}

fn default_enable_histograms() -> bool {
    true
}
