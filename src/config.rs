use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact configuration
    #[serde(default)]
    pub models: ModelConfig,

    /// Input validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Offline chart report configuration
    #[serde(default)]
    pub reports: ReportConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: ABSENTEE_)
            .add_source(
                config::Environment::with_prefix("ABSENTEE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: ModelConfig::default(),
            validation: ValidationConfig::default(),
            observability: ObservabilityConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the exported artifacts
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,

    /// Stacked regressor file name
    #[serde(default = "default_regressor_file")]
    pub regressor_file: String,

    /// K-means clusterer file name
    #[serde(default = "default_clusterer_file")]
    pub clusterer_file: String,

    /// Standard scaler file name
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,

    /// Cluster feature name list file name
    #[serde(default = "default_cluster_features_file")]
    pub cluster_features_file: String,

    /// Training column schema file name
    #[serde(default = "default_training_columns_file")]
    pub training_columns_file: String,

    /// Run the scaler + k-means stage after regression
    #[serde(default = "default_true")]
    pub clustering_enabled: bool,
}

impl ModelConfig {
    pub fn regressor_path(&self) -> PathBuf {
        self.dir.join(&self.regressor_file)
    }

    pub fn clusterer_path(&self) -> PathBuf {
        self.dir.join(&self.clusterer_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    pub fn cluster_features_path(&self) -> PathBuf {
        self.dir.join(&self.cluster_features_file)
    }

    pub fn training_columns_path(&self) -> PathBuf {
        self.dir.join(&self.training_columns_file)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
            regressor_file: default_regressor_file(),
            clusterer_file: default_clusterer_file(),
            scaler_file: default_scaler_file(),
            cluster_features_file: default_cluster_features_file(),
            training_columns_file: default_training_columns_file(),
            clustering_enabled: true,
        }
    }
}

/// How incomplete or degenerate records are treated
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValidationPolicy {
    /// Reject missing required fields and undefined derived values
    #[default]
    Strict,
    /// Default missing inputs to 0.0 and substitute 0.0 for undefined derived values
    Lenient,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    #[serde(default)]
    pub policy: ValidationPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Source dataset (CSV with header row)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Directory the chart images are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Render the charts once in the background when the server starts
    #[serde(default)]
    pub generate_on_startup: bool,

    /// Number of equal-width bins in the age histogram
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Mount the output directory at /static/images
    #[serde(default = "default_true")]
    pub serve_static: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            output_dir: default_output_dir(),
            generate_on_startup: false,
            histogram_bins: default_histogram_bins(),
            serve_static: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

fn default_regressor_file() -> String {
    "stack_model.json".to_string()
}

fn default_clusterer_file() -> String {
    "kmeans_model.json".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_cluster_features_file() -> String {
    "cluster_features.json".to_string()
}

fn default_training_columns_file() -> String {
    "X_columns.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "absentee-predictor".to_string()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("MFGEmployees.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/images")
}

fn default_histogram_bins() -> usize {
    15
}

fn default_true() -> bool {
    true
}
