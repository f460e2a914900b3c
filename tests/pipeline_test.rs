//! Integration tests for artifact loading and the prediction pipeline
//!
//! These tests verify:
//! - Loading the JSON artifact bundle from a model directory
//! - Fatal load errors for missing or inconsistent artifacts
//! - Feature engineering and schema alignment on real records
//! - Regression and cluster assignment end to end

mod common;

use absentee_predictor::config::ValidationPolicy;
use absentee_predictor::ml::{ModelArtifacts, Predictor};
use absentee_predictor::models::{EmployeeRecord, PredictionResponse};
use absentee_predictor::AppError;
use serde_json::json;
use std::sync::Arc;

fn sample_record() -> EmployeeRecord {
    EmployeeRecord::new(30.0, 5.0).with_attribute("DepartmentName", "X")
}

#[test]
fn test_load_full_bundle() {
    let dir = common::model_dir();
    let artifacts = ModelArtifacts::load(&common::model_config(dir.path(), true)).unwrap();

    assert_eq!(artifacts.schema.len(), 12);
    assert_eq!(artifacts.regressor.estimators.len(), 2);

    let clustering = artifacts.clustering.as_ref().unwrap();
    assert_eq!(
        clustering.features,
        vec!["Age", "LengthService", "AbsentHours"]
    );
    assert_eq!(clustering.kmeans.n_clusters(), 4);
}

#[test]
fn test_clustering_files_not_required_when_disabled() {
    let dir = common::model_dir();
    std::fs::remove_file(dir.path().join("kmeans_model.json")).unwrap();
    std::fs::remove_file(dir.path().join("scaler.json")).unwrap();

    let artifacts = ModelArtifacts::load(&common::model_config(dir.path(), false)).unwrap();
    assert!(artifacts.clustering.is_none());

    let err = ModelArtifacts::load(&common::model_config(dir.path(), true)).unwrap_err();
    assert_eq!(err.error_code(), "ARTIFACT_ERROR");
}

#[test]
fn test_missing_artifact_names_the_file() {
    let dir = common::model_dir();
    std::fs::remove_file(dir.path().join("stack_model.json")).unwrap();

    let err = ModelArtifacts::load(&common::model_config(dir.path(), true)).unwrap_err();
    match err {
        AppError::Artifact { artifact, .. } => assert!(artifact.ends_with("stack_model.json")),
        other => panic!("expected artifact error, got {other:?}"),
    }
}

#[test]
fn test_schema_width_mismatch_is_fatal() {
    let dir = common::model_dir();
    std::fs::write(
        dir.path().join("X_columns.json"),
        serde_json::to_vec(&json!(["Age", "LengthService"])).unwrap(),
    )
    .unwrap();

    let result = ModelArtifacts::load(&common::model_config(dir.path(), true));
    assert!(matches!(result, Err(AppError::Artifact { .. })));
}

#[test]
fn test_scaler_dimension_mismatch_is_fatal() {
    let dir = common::model_dir();
    std::fs::write(
        dir.path().join("scaler.json"),
        serde_json::to_vec(&json!({"mean": [0.0, 0.0], "scale": [1.0, 1.0]})).unwrap(),
    )
    .unwrap();

    let result = ModelArtifacts::load(&common::model_config(dir.path(), true));
    assert!(matches!(result, Err(AppError::Artifact { .. })));
}

#[test]
fn test_aligned_row_follows_schema_order() {
    let predictor = common::predictor(ValidationPolicy::Strict, true);

    let record = sample_record()
        .with_attribute("Gender", "F")
        .with_attribute("City", "Vancouver");
    let row = predictor.transformer().transform(&record).unwrap();

    let expected = [
        30.0,
        5.0,
        5.0 / 30.0,
        25.0,
        900.0,
        150.0,
        6.0,
        0.0,
        1.0,
        0.0,
        1.0,
        0.0,
    ];
    assert_eq!(row.values.len(), expected.len());
    for (got, want) in row.values.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
}

#[test]
fn test_prediction_and_cluster() {
    let predictor = common::predictor(ValidationPolicy::Strict, true);

    let outcome = predictor.predict(&sample_record()).unwrap();
    assert!((outcome.predicted_hours - common::EXPECTED_HOURS).abs() < 1e-9);

    let cluster = outcome.cluster.clone().unwrap();
    assert_eq!(cluster.id, 0);
    assert_eq!(cluster.name, "Low Risk Employees");

    let response = serde_json::to_value(PredictionResponse::from(outcome)).unwrap();
    assert_eq!(response["cluster_name"], "Low Risk Employees");
}

#[test]
fn test_older_employee_lands_in_higher_risk_cluster() {
    let predictor = common::predictor(ValidationPolicy::Strict, true);

    // linear: 30 + 20 + 0 + 10 = 60, stump: 60, final: 60
    let record = EmployeeRecord::new(60.0, 20.0).with_attribute("DepartmentName", "Stores");
    let outcome = predictor.predict(&record).unwrap();

    assert!((outcome.predicted_hours - 60.0).abs() < 1e-9);
    // scaled [2, 2, 3] is nearest the last centroid
    assert_eq!(outcome.cluster.unwrap().name, "Very High Risk Employees");
}

#[test]
fn test_concurrent_predictions_share_one_predictor() {
    let predictor = Arc::new(common::predictor(ValidationPolicy::Strict, true));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            std::thread::spawn(move || predictor.predict(&sample_record()).unwrap())
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().unwrap();
        assert!((outcome.predicted_hours - common::EXPECTED_HOURS).abs() < 1e-9);
    }
}

#[test]
fn test_predictor_from_in_memory_artifacts() {
    let dir = common::model_dir();
    let artifacts = ModelArtifacts::load(&common::model_config(dir.path(), false)).unwrap();
    drop(dir);

    let predictor = Predictor::new(artifacts, ValidationPolicy::Lenient);
    let outcome = predictor
        .predict(&EmployeeRecord::default().with_attribute("DepartmentName", "X"))
        .unwrap();

    // Missing inputs default to 0.0: linear 12, stump 20, final 16
    assert!((outcome.predicted_hours - 16.0).abs() < 1e-9);
    assert!(outcome.cluster.is_none());
}
