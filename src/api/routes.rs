use crate::api::{handlers, AppState};
use crate::metrics::{MetricsConfig, MetricsMiddleware};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.request_timeout_secs);
    let static_dir = state.static_dir.clone();
    let metrics_config = if state.metrics_enabled {
        MetricsConfig::default().exclude_path("/static")
    } else {
        MetricsConfig::disabled()
    };

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        // Prediction
        .route("/predict", post(handlers::predict))
        .route("/v1/predict", post(handlers::predict))
        // Model information
        .route("/v1/clusters", get(handlers::list_clusters))
        .route("/v1/model", get(handlers::model_summary));

    if state.metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    // Generated chart images
    if let Some(dir) = static_dir {
        router = router.nest_service("/static/images", ServeDir::new(dir));
    }

    router
        // Add state
        .with_state(state)
        // Add middleware
        .layer(MetricsMiddleware::layer_with_config(metrics_config))
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
