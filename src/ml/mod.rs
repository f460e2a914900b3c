/// Inference pipeline for absenteeism prediction
///
/// This module provides:
/// - Feature derivation, one-hot encoding and training-schema alignment
/// - Pre-trained regressors (linear, tree ensembles, stacking)
/// - Standardization and nearest-centroid cluster assignment
/// - Artifact loading and the request-facing predictor

pub mod artifacts;
pub mod cluster;
pub mod features;
pub mod regressor;
pub mod service;

pub use artifacts::{ClusteringArtifacts, ModelArtifacts};
pub use cluster::{KMeans, StandardScaler};
pub use features::{DerivedFeatures, EncodedRecord, FeatureTransformer, TrainingSchema};
pub use regressor::{Regressor, RegressorModel, StackingRegressor};
pub use service::{cluster_table, ClusterLabel, ModelSummary, Predictor};
