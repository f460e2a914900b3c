//! Shared fixtures for the integration tests.
//!
//! Writes a small, hand-computable model bundle into a temporary directory.
//! For `{Age: 30, LengthService: 5, DepartmentName: "X"}` the linear base
//! estimator gives 32, the stump gives 20 and the final estimator averages
//! them to 26. The clustering stage then lands in cluster 0.

#![allow(dead_code)]

use absentee_predictor::config::{ModelConfig, ValidationPolicy};
use absentee_predictor::ml::{ModelArtifacts, Predictor};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

pub const EXPECTED_HOURS: f64 = 26.0;

pub fn training_columns() -> Value {
    json!([
        "Age",
        "LengthService",
        "ServicePerAge",
        "ServiceSquared",
        "AgeSquared",
        "Age_x_Service",
        "AgeDivService",
        "IsShortService",
        "DepartmentName_X",
        "DepartmentName_Stores",
        "Gender_F",
        "Gender_M"
    ])
}

pub fn stack_model() -> Value {
    json!({
        "estimators": [
            {
                "type": "linear",
                "coefficients": [0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0],
                "intercept": 10.0
            },
            {
                "type": "decision_tree",
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [0, -2, -2],
                "threshold": [40.0, -2.0, -2.0],
                "value": [40.0, 20.0, 60.0]
            }
        ],
        "final_estimator": {"type": "linear", "coefficients": [0.5, 0.5], "intercept": 0.0},
        "passthrough": false
    })
}

fn write(dir: &Path, name: &str, value: &Value) {
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Write every artifact file into `dir`
pub fn write_model_dir(dir: &Path) {
    write(dir, "X_columns.json", &training_columns());
    write(dir, "stack_model.json", &stack_model());
    write(
        dir,
        "cluster_features.json",
        &json!(["Age", "LengthService", "AbsentHours"]),
    );
    write(
        dir,
        "scaler.json",
        &json!({"mean": [40.0, 10.0, 30.0], "scale": [10.0, 5.0, 10.0]}),
    );
    write(
        dir,
        "kmeans_model.json",
        &json!({"centroids": [
            [-1.0, -1.0, -1.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [2.0, 2.0, 2.0]
        ]}),
    );
}

pub fn model_config(dir: &Path, clustering_enabled: bool) -> ModelConfig {
    ModelConfig {
        dir: dir.to_path_buf(),
        clustering_enabled,
        ..ModelConfig::default()
    }
}

/// Fresh model directory populated with the fixture bundle
pub fn model_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());
    dir
}

pub fn predictor(policy: ValidationPolicy, clustering_enabled: bool) -> Predictor {
    let dir = model_dir();
    let artifacts = ModelArtifacts::load(&model_config(dir.path(), clustering_enabled)).unwrap();
    Predictor::new(artifacts, policy)
}

/// Parse Prometheus exposition format into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}
