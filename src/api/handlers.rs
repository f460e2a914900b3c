use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{
    gather_metrics, PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS, PREDICTION_ERRORS_TOTAL,
};
use crate::ml::{cluster_table, ClusterLabel, ModelSummary};
use crate::models::{EmployeeRecord, PredictionResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::time::Instant;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        clustering_enabled: state.predictor.clustering_enabled(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub clustering_enabled: bool,
}

/// Predict absenteeism hours (and risk cluster) for one employee record
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmployeeRecord>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let result = payload
        .map_err(|rejection| AppError::Serialization(rejection.body_text()))
        .and_then(|Json(record)| {
            let timer = Instant::now();
            let outcome = state.predictor.predict(&record);
            PREDICTION_DURATION_SECONDS.observe(timer.elapsed().as_secs_f64());
            outcome
        });

    match result {
        Ok(outcome) => {
            let cluster = outcome
                .cluster
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or("none");
            PREDICTIONS_TOTAL.with_label_values(&[cluster]).inc();

            Ok(Json(PredictionResponse::from(outcome)))
        }
        Err(err) => {
            PREDICTION_ERRORS_TOTAL
                .with_label_values(&[err.error_code()])
                .inc();
            Err(err)
        }
    }
}

/// Static cluster label table
pub async fn list_clusters() -> Json<Vec<ClusterLabel>> {
    Json(cluster_table())
}

/// Description of the loaded models
pub async fn model_summary(State(state): State<AppState>) -> Json<ModelSummary> {
    Json(state.predictor.summary())
}

/// Prometheus exposition endpoint
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        gather_metrics(),
    )
}
