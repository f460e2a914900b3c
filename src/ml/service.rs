use crate::config::ValidationPolicy;
use crate::error::{AppError, Result};
use crate::ml::artifacts::{ClusteringArtifacts, ModelArtifacts};
use crate::ml::features::{EncodedRecord, FeatureTransformer};
use crate::ml::regressor::{Regressor, StackingRegressor};
use crate::models::{
    ClusterAssignment, EmployeeRecord, PredictionOutcome, ABSENT_HOURS, CLUSTER_LABELS,
};
use ndarray::Array1;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Feature transformer, stacked regressor and optional clustering stage.
///
/// Holds only read-only state, so one instance is shared across requests.
pub struct Predictor {
    transformer: FeatureTransformer,
    regressor: StackingRegressor,
    clustering: Option<ClusteringArtifacts>,
}

impl Predictor {
    pub fn new(artifacts: ModelArtifacts, policy: ValidationPolicy) -> Self {
        let ModelArtifacts {
            schema,
            regressor,
            clustering,
        } = artifacts;

        Self {
            transformer: FeatureTransformer::new(Arc::new(schema), policy),
            regressor,
            clustering,
        }
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn clustering_enabled(&self) -> bool {
        self.clustering.is_some()
    }

    /// Run one record through the full pipeline
    pub fn predict(&self, record: &EmployeeRecord) -> Result<PredictionOutcome> {
        let row = self.transformer.transform(record)?;

        let predicted_hours = self.regressor.predict_one(row.values.view())?;
        if !predicted_hours.is_finite() {
            return Err(AppError::Internal(
                "regressor produced a non-finite prediction".to_string(),
            ));
        }

        let cluster = match &self.clustering {
            Some(stage) => Some(Self::assign_cluster(stage, &row.encoded, predicted_hours)?),
            None => None,
        };

        debug!(
            predicted_hours,
            cluster_id = cluster.as_ref().map(|c| c.id),
            "Prediction complete"
        );

        Ok(PredictionOutcome {
            predicted_hours,
            cluster,
        })
    }

    fn assign_cluster(
        stage: &ClusteringArtifacts,
        encoded: &EncodedRecord,
        predicted_hours: f64,
    ) -> Result<ClusterAssignment> {
        let input = stage
            .features
            .iter()
            .map(|name| {
                if name == ABSENT_HOURS {
                    return Ok(predicted_hours);
                }
                encoded.get(name).ok_or_else(|| {
                    if encoded.encoded.keys().any(|k| k.starts_with(&format!("{name}_"))) {
                        AppError::Validation(format!("cluster feature {name} must be numeric"))
                    } else {
                        AppError::missing_field(name.as_str())
                    }
                })
            })
            .collect::<Result<Array1<f64>>>()?;

        let scaled = stage.scaler.transform(input.view())?;
        let id = stage.kmeans.predict(scaled.view())?;
        Ok(ClusterAssignment::from_id(id))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            training_columns: self.transformer.schema().columns().to_vec(),
            n_training_columns: self.transformer.schema().len(),
            base_estimators: self
                .regressor
                .estimators
                .iter()
                .map(|e| e.name().to_string())
                .collect(),
            final_estimator: self.regressor.final_estimator.name().to_string(),
            passthrough: self.regressor.passthrough,
            clustering_enabled: self.clustering_enabled(),
            cluster_features: self
                .clustering
                .as_ref()
                .map(|c| c.features.clone())
                .unwrap_or_default(),
            n_clusters: self.clustering.as_ref().map(|c| c.kmeans.n_clusters()),
            validation_policy: self.transformer.policy(),
        }
    }
}

/// Description of the loaded models
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub training_columns: Vec<String>,
    pub n_training_columns: usize,
    pub base_estimators: Vec<String>,
    pub final_estimator: String,
    pub passthrough: bool,
    pub clustering_enabled: bool,
    pub cluster_features: Vec<String>,
    pub n_clusters: Option<usize>,
    pub validation_policy: ValidationPolicy,
}

/// Entry of the cluster label table
#[derive(Debug, Clone, Serialize)]
pub struct ClusterLabel {
    pub id: usize,
    pub name: &'static str,
}

pub fn cluster_table() -> Vec<ClusterLabel> {
    CLUSTER_LABELS
        .iter()
        .enumerate()
        .map(|(id, name)| ClusterLabel { id, name })
        .collect()
}
