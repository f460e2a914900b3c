use crate::error::{AppError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Trait for pre-trained regressors
pub trait Regressor: Send + Sync {
    /// Predict a single row
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64>;

    /// Check the model against the width of the rows it will receive
    fn validate(&self, n_features: usize) -> Result<()>;

    /// Short model name for logs and summaries
    fn name(&self) -> &'static str;
}

fn check_width(features: ArrayView1<'_, f64>, expected: usize, model: &str) -> Result<()> {
    if features.len() != expected {
        return Err(AppError::Internal(format!(
            "{model} expects {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

/// Linear model: `intercept + coefficients · x`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl Regressor for LinearRegressor {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        check_width(features, self.coefficients.len(), self.name())?;
        let coefficients = ArrayView1::from(self.coefficients.as_slice());
        Ok(self.intercept + coefficients.dot(&features))
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.coefficients.len() != n_features {
            return Err(AppError::artifact(
                "regressor",
                format!(
                    "linear model has {} coefficients for {} inputs",
                    self.coefficients.len(),
                    n_features
                ),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Binary regression tree in flat array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise the walk goes
/// left when `x[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl DecisionTreeRegressor {
    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    fn child(index: i64, parent: usize, n_nodes: usize) -> Result<usize> {
        // Children always follow their parent, which bounds every walk.
        match usize::try_from(index) {
            Ok(child) if child > parent && child < n_nodes => Ok(child),
            _ => Err(AppError::artifact(
                "regressor",
                format!("node {parent} has invalid child index {index}"),
            )),
        }
    }

    fn at<T: Copy>(values: &[T], node: usize, array: &str) -> Result<T> {
        values
            .get(node)
            .copied()
            .ok_or_else(|| AppError::Internal(format!("tree has no {array} entry for node {node}")))
    }
}

impl Regressor for DecisionTreeRegressor {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let mut node = 0usize;

        // A walk that reaches no leaf within n_nodes steps has a cycle
        for _ in 0..self.n_nodes() {
            let left = Self::at(&self.children_left, node, "children_left")?;
            if left == -1 {
                return Self::at(&self.value, node, "value");
            }

            let feature = Self::at(&self.feature, node, "feature")?;
            let x = usize::try_from(feature)
                .ok()
                .and_then(|index| features.get(index).copied())
                .ok_or_else(|| {
                    AppError::Internal(format!("tree split on missing feature {feature}"))
                })?;

            let next = if x <= Self::at(&self.threshold, node, "threshold")? {
                left
            } else {
                Self::at(&self.children_right, node, "children_right")?
            };
            node = usize::try_from(next).map_err(|_| {
                AppError::Internal(format!("node {node} has invalid child index {next}"))
            })?;
        }

        Err(AppError::Internal("tree walk did not reach a leaf".to_string()))
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(AppError::artifact("regressor", "tree has no nodes"));
        }

        let lengths = [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ];
        if lengths.iter().any(|&len| len != n_nodes) {
            return Err(AppError::artifact(
                "regressor",
                "tree arrays have mismatched lengths",
            ));
        }

        for node in 0..n_nodes {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == -1 || right == -1 {
                if left != right {
                    return Err(AppError::artifact(
                        "regressor",
                        format!("node {node} has exactly one child"),
                    ));
                }
                continue;
            }

            Self::child(left, node, n_nodes)?;
            Self::child(right, node, n_nodes)?;

            match usize::try_from(self.feature[node]) {
                Ok(feature) if feature < n_features => {}
                _ => {
                    return Err(AppError::artifact(
                        "regressor",
                        format!(
                            "node {node} splits on feature {} of {n_features}",
                            self.feature[node]
                        ),
                    ))
                }
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "decision_tree"
    }
}

/// Mean of independently trained trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub trees: Vec<DecisionTreeRegressor>,
}

impl Regressor for RandomForestRegressor {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_one(features)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AppError::artifact("regressor", "forest has no trees"));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}

/// Additive tree ensemble: `init + learning_rate * Σ tree(x)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<DecisionTreeRegressor>,
}

impl Regressor for GradientBoostingRegressor {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_one(features)?;
        }
        Ok(self.init + self.learning_rate * sum)
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }

    fn name(&self) -> &'static str {
        "gradient_boosting"
    }
}

/// Any supported base or final estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegressorModel {
    Linear(LinearRegressor),
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl RegressorModel {
    fn inner(&self) -> &dyn Regressor {
        match self {
            RegressorModel::Linear(m) => m,
            RegressorModel::DecisionTree(m) => m,
            RegressorModel::RandomForest(m) => m,
            RegressorModel::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for RegressorModel {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        self.inner().predict_one(features)
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        self.inner().validate(n_features)
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }
}

/// Stacking ensemble: base estimator outputs (optionally followed by the
/// original row) feed a final estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackingRegressor {
    pub estimators: Vec<RegressorModel>,
    pub final_estimator: Box<RegressorModel>,
    #[serde(default)]
    pub passthrough: bool,
}

impl StackingRegressor {
    /// Width of the final estimator's input for rows of `n_features`
    pub fn meta_width(&self, n_features: usize) -> usize {
        self.estimators.len() + if self.passthrough { n_features } else { 0 }
    }

    fn meta_features(&self, features: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        let mut meta = Vec::with_capacity(self.meta_width(features.len()));
        for estimator in &self.estimators {
            meta.push(estimator.predict_one(features)?);
        }
        if self.passthrough {
            meta.extend(features.iter().copied());
        }
        Ok(Array1::from(meta))
    }
}

impl Regressor for StackingRegressor {
    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let meta = self.meta_features(features)?;
        self.final_estimator.predict_one(meta.view())
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.estimators.is_empty() {
            return Err(AppError::artifact(
                "regressor",
                "stacking model has no base estimators",
            ));
        }
        for estimator in &self.estimators {
            estimator.validate(n_features)?;
        }
        self.final_estimator.validate(self.meta_width(n_features))
    }

    fn name(&self) -> &'static str {
        "stacking"
    }
}
