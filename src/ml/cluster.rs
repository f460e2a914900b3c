use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Pre-fitted standardization: `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

/// On-disk form of [`StandardScaler`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self> {
        if artifact.mean.len() != artifact.scale.len() {
            return Err(AppError::artifact(
                "scaler",
                format!(
                    "mean has {} entries but scale has {}",
                    artifact.mean.len(),
                    artifact.scale.len()
                ),
            ));
        }
        if artifact
            .mean
            .iter()
            .chain(artifact.scale.iter())
            .any(|v| !v.is_finite())
        {
            return Err(AppError::artifact("scaler", "non-finite parameter"));
        }

        // Zero-variance features were fitted with unit scale.
        let scale = artifact
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: Array1::from(artifact.mean),
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if features.len() != self.n_features() {
            return Err(AppError::Internal(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }
        Ok((&features - &self.mean) / &self.scale)
    }
}

/// Nearest-centroid cluster assignment
#[derive(Debug, Clone)]
pub struct KMeans {
    centroids: Array2<f64>,
}

/// On-disk form of [`KMeans`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansArtifact {
    pub centroids: Vec<Vec<f64>>,
}

impl KMeans {
    pub fn from_artifact(artifact: KMeansArtifact) -> Result<Self> {
        let n_clusters = artifact.centroids.len();
        let n_features = artifact.centroids.first().map(Vec::len).unwrap_or(0);

        if n_clusters == 0 || n_features == 0 {
            return Err(AppError::artifact("clusterer", "no centroids"));
        }
        if artifact.centroids.iter().any(|c| c.len() != n_features) {
            return Err(AppError::artifact(
                "clusterer",
                "centroids have differing dimensions",
            ));
        }

        let flat: Vec<f64> = artifact.centroids.into_iter().flatten().collect();
        let centroids = Array2::from_shape_vec((n_clusters, n_features), flat)
            .map_err(|e| AppError::artifact("clusterer", e.to_string()))?;

        Ok(Self { centroids })
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.centroids.ncols()
    }

    /// Index of the nearest centroid by squared Euclidean distance; ties go
    /// to the lowest index.
    pub fn predict(&self, features: ArrayView1<'_, f64>) -> Result<usize> {
        if features.len() != self.n_features() {
            return Err(AppError::Internal(format!(
                "clusterer expects {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }

        let mut best = (0usize, f64::INFINITY);
        for (index, centroid) in self.centroids.axis_iter(Axis(0)).enumerate() {
            let distance = (&centroid - &features).mapv(|d| d * d).sum();
            if distance < best.1 {
                best = (index, distance);
            }
        }

        if !best.1.is_finite() {
            return Err(AppError::Internal(
                "cluster distance is not finite".to_string(),
            ));
        }

        Ok(best.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaler_transform() {
        let scaler = StandardScaler::from_artifact(ScalerArtifact {
            mean: vec![40.0, 10.0],
            scale: vec![10.0, 0.0],
        })
        .unwrap();

        let scaled = scaler.transform(array![30.0, 12.0].view()).unwrap();
        assert_eq!(scaled.to_vec(), vec![-1.0, 2.0]);
        assert!(scaler.transform(array![1.0].view()).is_err());
    }

    #[test]
    fn test_scaler_rejects_mismatch() {
        let result = StandardScaler::from_artifact(ScalerArtifact {
            mean: vec![1.0],
            scale: vec![1.0, 2.0],
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_kmeans_nearest_centroid() {
        let kmeans = KMeans::from_artifact(KMeansArtifact {
            centroids: vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![10.0, 0.0]],
        })
        .unwrap();

        assert_eq!(kmeans.n_clusters(), 3);
        assert_eq!(kmeans.predict(array![1.0, 1.0].view()).unwrap(), 0);
        assert_eq!(kmeans.predict(array![6.0, 4.0].view()).unwrap(), 1);
        assert_eq!(kmeans.predict(array![9.0, -1.0].view()).unwrap(), 2);
    }

    #[test]
    fn test_kmeans_tie_goes_to_lowest_index() {
        let kmeans = KMeans::from_artifact(KMeansArtifact {
            centroids: vec![vec![-1.0], vec![1.0]],
        })
        .unwrap();
        assert_eq!(kmeans.predict(array![0.0].view()).unwrap(), 0);
    }

    #[test]
    fn test_kmeans_rejects_ragged_centroids() {
        assert!(KMeans::from_artifact(KMeansArtifact {
            centroids: vec![vec![1.0, 2.0], vec![1.0]],
        })
        .is_err());
        assert!(KMeans::from_artifact(KMeansArtifact { centroids: vec![] }).is_err());
    }
}
