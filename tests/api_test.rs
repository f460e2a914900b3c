//! HTTP surface tests driven through the router with `oneshot`.

mod common;

use absentee_predictor::api::{build_router, AppState};
use absentee_predictor::config::ValidationPolicy;
use absentee_predictor::metrics::init_metrics;
use absentee_predictor::models::CLUSTER_LABELS;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(policy: ValidationPolicy, clustering: bool) -> Router {
    let predictor = common::predictor(policy, clustering);
    build_router(AppState::new(Arc::new(predictor)))
}

async fn post_json(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn record(value: Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

#[tokio::test]
async fn test_predict_end_to_end() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": 30, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let hours = body["predicted_hours"].as_f64().unwrap();
    assert!((hours - common::EXPECTED_HOURS).abs() < 1e-9);
    assert_eq!(body["cluster_id"], 0);

    let name = body["cluster_name"].as_str().unwrap();
    assert!(CLUSTER_LABELS.contains(&name));
    assert_eq!(name, "Low Risk Employees");
}

#[tokio::test]
async fn test_versioned_predict_alias() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(
        app,
        "/v1/predict",
        record(json!({"Age": "30", "LengthService": "5", "DepartmentName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!((body["predicted_hours"].as_f64().unwrap() - common::EXPECTED_HOURS).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_without_clustering_omits_cluster_fields() {
    let app = app(ValidationPolicy::Strict, false);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": 30, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("predicted_hours"));
}

#[tokio::test]
async fn test_zero_age_is_rejected_under_strict_policy() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": 0, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DEGENERATE_INPUT");
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn test_zero_age_uses_sentinel_under_lenient_policy() {
    let app = app(ValidationPolicy::Lenient, true);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": 0, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;

    // linear: 0 + 5 + 2 + 10 = 17, stump: 20, final: 18.5
    assert_eq!(status, StatusCode::OK);
    assert!((body["predicted_hours"].as_f64().unwrap() - 18.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_missing_field_names_the_field() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": 30, "DepartmentName": "X"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_FIELD");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("LengthService"));
}

#[tokio::test]
async fn test_non_numeric_age_is_a_validation_error() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(
        app,
        "/predict",
        record(json!({"Age": "thirty", "LengthService": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_wrongly_typed_fields_are_validation_errors() {
    let cases = [
        json!({"Age": true, "LengthService": 5}),
        json!({"Age": 30, "LengthService": {"years": 5}}),
        json!({"Age": 30, "LengthService": 5, "Tags": ["a"]}),
        json!({"Age": 30, "LengthService": 5, "Meta": {"k": 1}}),
    ];

    for case in cases {
        let app = app(ValidationPolicy::Strict, true);
        let (status, body) = post_json(app, "/predict", record(case.clone())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{case}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_server_error() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, body) = post_json(app, "/predict", "{\"Age\": 30,").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "SERIALIZATION_ERROR");
}

#[tokio::test]
async fn test_health_check() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, bytes) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["clustering_enabled"], true);
}

#[tokio::test]
async fn test_list_clusters() {
    let app = app(ValidationPolicy::Strict, true);

    let (status, bytes) = get(app, "/v1/clusters").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let clusters = body.as_array().unwrap();
    assert_eq!(clusters.len(), 4);
    assert_eq!(clusters[3]["id"], 3);
    assert_eq!(clusters[3]["name"], "Very High Risk Employees");
}

#[tokio::test]
async fn test_model_summary() {
    let app = app(ValidationPolicy::Lenient, true);

    let (status, bytes) = get(app, "/v1/model").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["n_training_columns"], 12);
    assert_eq!(body["base_estimators"], json!(["linear", "decision_tree"]));
    assert_eq!(body["final_estimator"], "linear");
    assert_eq!(body["n_clusters"], 4);
    assert_eq!(body["validation_policy"], "lenient");
}

#[tokio::test]
async fn test_metrics_endpoint_counts_predictions() {
    init_metrics().unwrap();
    let app = app(ValidationPolicy::Strict, true);

    let (status, _) = post_json(
        app.clone(),
        "/predict",
        record(json!({"Age": 30, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, bytes) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let output = String::from_utf8(bytes).unwrap();
    let metrics = common::parse_prometheus_output(&output);

    let predictions = metrics
        .get("absentee_predictor_predictions_total")
        .expect("predictions counter exported");
    assert!(predictions
        .iter()
        .any(|line| line.contains("cluster=\"Low Risk Employees\"")));
    assert!(metrics.contains_key("absentee_predictor_http_requests_total"));
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let predictor = common::predictor(ValidationPolicy::Strict, true);
    let app = build_router(AppState::new(Arc::new(predictor)).with_metrics(false));

    let (status, _) = get(app.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        app,
        "/predict",
        record(json!({"Age": 30, "LengthService": 5, "DepartmentName": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app(ValidationPolicy::Strict, true);
    let (status, _) = get(app, "/v2/predict").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
