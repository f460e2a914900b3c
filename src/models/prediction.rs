use serde::{Deserialize, Serialize};

/// Static cluster labels, indexed by cluster id
pub const CLUSTER_LABELS: [&str; 4] = [
    "Low Risk Employees",
    "Moderate Risk Employees",
    "High Risk Employees",
    "Very High Risk Employees",
];

/// Label for cluster ids outside the table
pub const UNKNOWN_CLUSTER: &str = "Unknown";

/// Map a cluster id to its risk label
pub fn cluster_label(cluster_id: usize) -> &'static str {
    CLUSTER_LABELS
        .get(cluster_id)
        .copied()
        .unwrap_or(UNKNOWN_CLUSTER)
}

/// Discrete risk category assigned by the clustering stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub id: usize,
    pub name: String,
}

impl ClusterAssignment {
    pub fn from_id(id: usize) -> Self {
        Self {
            id,
            name: cluster_label(id).to_string(),
        }
    }
}

/// Result of running one record through the predictor
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub predicted_hours: f64,
    pub cluster: Option<ClusterAssignment>,
}

/// Body returned by the prediction endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_hours: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

impl From<PredictionOutcome> for PredictionResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        let (cluster_id, cluster_name) = match outcome.cluster {
            Some(cluster) => (Some(cluster.id), Some(cluster.name)),
            None => (None, None),
        };

        Self {
            predicted_hours: outcome.predicted_hours,
            cluster_id,
            cluster_name,
        }
    }
}
