//! Gradient Boosting Machine - squared-error regression trees
//!
//! Boosted CART regressors with second-order split gain and L2-regularised
//! leaf weights. With squared error every hessian is 1, so the gain of a
//! split reduces to `GL²/(nL+λ) + GR²/(nR+λ) - G²/(n+λ)` where `G` is the
//! residual sum of a node.
//!
//! Trees are stored as flat node arrays so the fitted model serializes
//! straight to JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur with the model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Malformed tree {tree}: {reason}")]
    CorruptTree { tree: usize, reason: String },
}

/// GBM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Minimum gain required to split a node
    pub min_split_gain: f64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            lambda: 1.0,
            min_split_gain: 0.0,
        }
    }
}

impl GbmParams {
    fn check(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidData("n_estimators must be > 0".to_string()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidData(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidData("min_samples_leaf must be > 0".to_string()));
        }
        if self.lambda < 0.0 {
            return Err(ModelError::InvalidData("lambda must be >= 0".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// REGRESSION TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] < threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeFitter<'a> {
    x: &'a [Vec<f64>],
    residuals: &'a [f64],
    params: &'a GbmParams,
    nodes: Vec<Node>,
    gains: Vec<f64>,
}

impl RegressionTree {
    /// Fit one tree to the residuals of the rows in `indices`.
    /// Split gains are accumulated per feature into `gains`.
    fn fit(
        x: &[Vec<f64>],
        residuals: &[f64],
        indices: Vec<usize>,
        params: &GbmParams,
        gains: &mut [f64],
    ) -> Self {
        let mut fitter = TreeFitter {
            x,
            residuals,
            params,
            nodes: Vec::new(),
            gains: vec![0.0; gains.len()],
        };
        fitter.grow(indices, 0);

        for (total, gain) in gains.iter_mut().zip(&fitter.gains) {
            *total += gain;
        }

        Self { nodes: fitter.nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Split { feature, threshold, left, right }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if value < *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    /// Check the node array is a well-formed tree over `feature_count`
    /// features. Children must sit after their parent and inside the array,
    /// which also guarantees `predict` terminates.
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= feature_count {
                        return Err(format!(
                            "node {} splits on feature {} but the model has {}",
                            index, feature, feature_count
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} points to child {} (valid range {}..{})",
                                index,
                                child,
                                index + 1,
                                self.nodes.len()
                            ));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("node {} has a non-finite leaf value", index));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

impl TreeFitter<'_> {
    fn leaf_value(&self, sum: f64, count: usize) -> f64 {
        sum / (count as f64 + self.params.lambda)
    }

    fn score(&self, sum: f64, count: usize) -> f64 {
        sum * sum / (count as f64 + self.params.lambda)
    }

    /// Grow a node over `indices`, returning its position in `nodes`
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let sum: f64 = indices.iter().map(|&i| self.residuals[i]).sum();
        let position = self.nodes.len();
        self.nodes.push(Node::Leaf { value: self.leaf_value(sum, indices.len()) });

        if depth >= self.params.max_depth || indices.len() < 2 * self.params.min_samples_leaf {
            return position;
        }

        let Some(best) = self.best_split(&indices, sum) else {
            return position;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][best.feature] < best.threshold);

        self.gains[best.feature] += best.gain;
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[position] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };

        position
    }

    fn best_split(&self, indices: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent = self.score(total, n);
        let feature_count = self.x.first().map_or(0, Vec::len);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..feature_count {
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            for split in 1..n {
                left_sum += self.residuals[sorted[split - 1]];

                let lo = self.x[sorted[split - 1]][feature];
                let hi = self.x[sorted[split]][feature];
                if lo == hi || split < min_leaf || n - split < min_leaf {
                    continue;
                }

                let gain = self.score(left_sum, split) + self.score(total - left_sum, n - split) - parent;
                if gain <= self.params.min_split_gain {
                    continue;
                }

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

// ============================================================================
// BOOSTED ENSEMBLE
// ============================================================================

/// Gradient Boosting Regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    params: GbmParams,
    base_score: f64,
    feature_names: Vec<String>,
    trees: Vec<RegressionTree>,
    /// Total split gain per feature, normalised to sum to 1
    feature_importance: Vec<f64>,
}

impl GradientBoostedRegressor {
    /// Fit a boosted ensemble on a row-major feature matrix
    pub fn fit(
        params: GbmParams,
        feature_names: Vec<String>,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> Result<Self, ModelError> {
        params.check()?;

        if x.is_empty() {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }
        if x.len() != y.len() {
            return Err(ModelError::InvalidData(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if let Some(row) = x.iter().find(|row| row.len() != feature_names.len()) {
            return Err(ModelError::FeatureCount {
                expected: feature_names.len(),
                actual: row.len(),
            });
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData("Non-finite value in training data".to_string()));
        }

        info!(
            "Training GBM regressor with {} samples and {} features",
            x.len(),
            feature_names.len()
        );
        debug!("Parameters: {:?}", params);

        let base_score = y.iter().sum::<f64>() / y.len() as f64;
        let mut predictions = vec![base_score; y.len()];
        let mut residuals = vec![0.0; y.len()];
        let mut gains = vec![0.0; feature_names.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for ((r, target), pred) in residuals.iter_mut().zip(y).zip(&predictions) {
                *r = target - pred;
            }

            let tree = RegressionTree::fit(x, &residuals, (0..y.len()).collect(), &params, &mut gains);
            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }

            if round % 25 == 0 {
                let mse = residuals.iter().map(|r| r * r).sum::<f64>() / y.len() as f64;
                debug!("round {}: train mse {:.4}, {} nodes", round, mse, tree.node_count());
            }
            trees.push(tree);
        }

        let total_gain: f64 = gains.iter().sum();
        let feature_importance = if total_gain > 0.0 {
            gains.iter().map(|g| g / total_gain).collect()
        } else {
            vec![0.0; gains.len()]
        };

        info!("Model training completed successfully ({} trees)", trees.len());

        Ok(Self {
            params,
            base_score,
            feature_names,
            trees,
            feature_importance,
        })
    }

    /// Structural check for a model read back from disk
    pub fn validate(&self) -> Result<(), ModelError> {
        let feature_count = self.feature_names.len();
        for (tree, regression_tree) in self.trees.iter().enumerate() {
            regression_tree
                .validate(feature_count)
                .map_err(|reason| ModelError::CorruptTree { tree, reason })?;
        }
        Ok(())
    }

    /// Predict a single row; the row must be in `feature_names` order
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.feature_names.len() {
            return Err(ModelError::FeatureCount {
                expected: self.feature_names.len(),
                actual: row.len(),
            });
        }

        let boost: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        Ok(self.base_score + self.params.learning_rate * boost)
    }

    /// Predict many rows
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Feature importance (normalised total gain), highest first
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.feature_importance.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}
