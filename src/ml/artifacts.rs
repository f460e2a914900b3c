use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::ml::cluster::{KMeans, KMeansArtifact, ScalerArtifact, StandardScaler};
use crate::ml::features::TrainingSchema;
use crate::ml::regressor::{Regressor, StackingRegressor};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Scaler, clusterer and the ordered features they consume
#[derive(Debug, Clone)]
pub struct ClusteringArtifacts {
    pub features: Vec<String>,
    pub scaler: StandardScaler,
    pub kmeans: KMeans,
}

impl ClusteringArtifacts {
    pub fn new(features: Vec<String>, scaler: StandardScaler, kmeans: KMeans) -> Result<Self> {
        if features.is_empty() {
            return Err(AppError::artifact(
                "cluster features",
                "feature list is empty",
            ));
        }
        if scaler.n_features() != features.len() {
            return Err(AppError::artifact(
                "scaler",
                format!(
                    "fitted on {} features but {} cluster features are listed",
                    scaler.n_features(),
                    features.len()
                ),
            ));
        }
        if kmeans.n_features() != features.len() {
            return Err(AppError::artifact(
                "clusterer",
                format!(
                    "centroids have {} dimensions but {} cluster features are listed",
                    kmeans.n_features(),
                    features.len()
                ),
            ));
        }

        Ok(Self {
            features,
            scaler,
            kmeans,
        })
    }
}

/// Every artifact the predictor needs, validated for mutual consistency
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub schema: TrainingSchema,
    pub regressor: StackingRegressor,
    pub clustering: Option<ClusteringArtifacts>,
}

impl ModelArtifacts {
    pub fn new(
        schema: TrainingSchema,
        regressor: StackingRegressor,
        clustering: Option<ClusteringArtifacts>,
    ) -> Result<Self> {
        regressor.validate(schema.len())?;
        Ok(Self {
            schema,
            regressor,
            clustering,
        })
    }

    /// Load the artifacts named by the model configuration. Clustering
    /// artifacts are only read when clustering is enabled.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        info!(dir = %config.dir.display(), "Loading model artifacts");

        let columns: Vec<String> = read_json(&config.training_columns_path())?;
        let schema = TrainingSchema::new(columns)?;
        debug!(columns = schema.len(), "Training schema loaded");

        let regressor: StackingRegressor = read_json(&config.regressor_path())?;
        debug!(
            estimators = regressor.estimators.len(),
            passthrough = regressor.passthrough,
            "Stacked regressor loaded"
        );

        let clustering = if config.clustering_enabled {
            let features: Vec<String> = read_json(&config.cluster_features_path())?;
            let scaler =
                StandardScaler::from_artifact(read_json::<ScalerArtifact>(&config.scaler_path())?)?;
            let kmeans =
                KMeans::from_artifact(read_json::<KMeansArtifact>(&config.clusterer_path())?)?;
            debug!(
                features = features.len(),
                clusters = kmeans.n_clusters(),
                "Clustering artifacts loaded"
            );
            Some(ClusteringArtifacts::new(features, scaler, kmeans)?)
        } else {
            info!("Clustering disabled; scaler and clusterer not loaded");
            None
        };

        Self::new(schema, regressor, clustering)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let name = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| AppError::artifact(&name, e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::artifact(&name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    fn write_fixture(dir: &Path) {
        write(dir, "X_columns.json", json!(["Age", "LengthService"]));
        write(
            dir,
            "stack_model.json",
            json!({
                "estimators": [{"type": "linear", "coefficients": [1.0, 1.0], "intercept": 0.0}],
                "final_estimator": {"type": "linear", "coefficients": [1.0], "intercept": 0.0}
            }),
        );
        write(dir, "cluster_features.json", json!(["Age", "AbsentHours"]));
        write(dir, "scaler.json", json!({"mean": [0.0, 0.0], "scale": [1.0, 1.0]}));
        write(dir, "kmeans_model.json", json!({"centroids": [[0.0, 0.0], [1.0, 1.0]]}));
    }

    fn model_config(dir: &Path) -> ModelConfig {
        ModelConfig {
            dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let artifacts = ModelArtifacts::load(&model_config(dir.path())).unwrap();
        assert_eq!(artifacts.schema.len(), 2);
        assert_eq!(artifacts.regressor.estimators.len(), 1);
        let clustering = artifacts.clustering.unwrap();
        assert_eq!(clustering.features, vec!["Age", "AbsentHours"]);
        assert_eq!(clustering.kmeans.n_clusters(), 2);
    }

    #[test]
    fn test_clustering_disabled_skips_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::remove_file(dir.path().join("kmeans_model.json")).unwrap();

        let mut config = model_config(dir.path());
        config.clustering_enabled = false;

        let artifacts = ModelArtifacts::load(&config).unwrap();
        assert!(artifacts.clustering.is_none());
    }

    #[test]
    fn test_missing_file_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifacts::load(&model_config(dir.path())).unwrap_err();
        assert_eq!(err.error_code(), "ARTIFACT_ERROR");
        assert!(err.to_string().contains("X_columns.json"));
    }

    #[test]
    fn test_regressor_width_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        write(dir.path(), "X_columns.json", json!(["Age", "LengthService", "Extra"]));

        assert!(ModelArtifacts::load(&model_config(dir.path())).is_err());
    }

    #[test]
    fn test_scaler_dimension_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        write(dir.path(), "scaler.json", json!({"mean": [0.0], "scale": [1.0]}));

        let err = ModelArtifacts::load(&model_config(dir.path())).unwrap_err();
        assert!(err.to_string().contains("scaler"));
    }
}
