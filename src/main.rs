use absentee_predictor::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    metrics::init_metrics,
    ml::{ModelArtifacts, Predictor},
    reports::ReportGenerator,
};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration before logging so the log format can follow it
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_tracing(&config.observability);

    if let Some(e) = config_error {
        tracing::warn!("Failed to load configuration: {}", e);
        tracing::warn!("Using default configuration");
    }

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        policy = %config.validation.policy,
        clustering = config.models.clustering_enabled,
        "Validation policy and clustering mode"
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Load model artifacts; the service cannot run without them
    let artifacts = ModelArtifacts::load(&config.models).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            config.models.dir.display()
        )
    })?;
    let predictor = Arc::new(Predictor::new(artifacts, config.validation.policy));
    let summary = predictor.summary();
    tracing::info!(
        base_estimators = summary.base_estimators.len(),
        final_estimator = %summary.final_estimator,
        features = summary.n_training_columns,
        clustering = summary.clustering_enabled,
        "Model artifacts loaded"
    );

    // One-shot chart report in the background
    if config.reports.generate_on_startup {
        let generator = ReportGenerator::from_config(&config.reports);
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || generator.generate()).await {
                Ok(Ok(report)) => {
                    tracing::info!(files = report.files.len(), "Startup chart report written")
                }
                Ok(Err(e)) => tracing::error!("Startup chart report failed: {}", e),
                Err(e) => tracing::error!("Startup chart report task panicked: {}", e),
            }
        });
    }

    let mut app_state = AppState::new(predictor)
        .with_request_timeout(config.server.request_timeout_secs)
        .with_metrics(config.observability.prometheus_enabled);
    if config.reports.serve_static {
        app_state = app_state.with_static_dir(&config.reports.output_dir);
    }

    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Prediction: http://{}/predict", http_addr);
    if config.observability.prometheus_enabled {
        tracing::info!("   Metrics: http://{}/metrics", http_addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let level = &observability.log_level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("absentee_predictor={level},tower_http={level}").into());

    let json = observability.json_logs;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // A listener failure is not a shutdown request
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
