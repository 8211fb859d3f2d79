//! Risk Regressors
//!
//! The training pipeline exports its fitted model as a tagged JSON
//! document. Two shapes are understood: a linear model and a tree ensemble
//! (covers single decision trees, random forests and boosted trees).

use std::path::Path;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{features::FEATURE_COUNT, InferenceError};

/// Anything that maps a feature vector to a continuous risk score.
pub trait Regressor: Send + Sync {
    /// Predict a score for one feature vector of width [`FEATURE_COUNT`].
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64;
}

/// Pre-trained risk model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskModel {
    /// `intercept + coefficients · x`
    Linear(LinearModel),
    /// Ensemble of regression trees
    TreeEnsemble(TreeEnsemble),
}

impl RiskModel {
    /// Load and validate a model artifact.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model: RiskModel =
            serde_json::from_str(&raw).map_err(|source| InferenceError::Decode {
                path: path.display().to_string(),
                source,
            })?;
        model.validate()?;
        Ok(model)
    }

    /// Structural checks performed once at load time.
    pub fn validate(&self) -> Result<(), InferenceError> {
        match self {
            RiskModel::Linear(m) => m.validate(),
            RiskModel::TreeEnsemble(m) => m.validate(),
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            RiskModel::Linear(_) => "linear".into(),
            RiskModel::TreeEnsemble(m) => format!("tree_ensemble({} trees)", m.trees.len()),
        }
    }
}

impl Regressor for RiskModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        match self {
            RiskModel::Linear(m) => m.predict(features),
            RiskModel::TreeEnsemble(m) => m.predict(features),
        }
    }
}

/// Linear regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// Bias term
    pub intercept: f64,
    /// One weight per feature
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), InferenceError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(InferenceError::InvalidModel(format!(
                "linear model expects {} coefficients, got {}",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.intercept + ArrayView1::from(&self.coefficients[..]).dot(&features)
    }
}

/// How per-tree outputs are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest style
    #[default]
    Mean,
    /// Gradient boosting style
    Sum,
}

/// Ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Combination rule
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Added to the aggregated tree output
    #[serde(default)]
    pub base_score: f64,
    /// Member trees
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidModel("tree ensemble has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| InferenceError::InvalidModel(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        self.base_score + combined
    }
}

/// Single regression tree, nodes stored in pre-order with the root at 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Flattened nodes
    pub nodes: Vec<TreeNode>,
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, else `right`
    Split {
        /// Feature index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Terminal node
    Leaf {
        /// Predicted value
        value: f64,
    },
}

impl DecisionTree {
    // Children must point strictly forward, which rules out cycles.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, .. } = *node {
                if feature >= FEATURE_COUNT {
                    return Err(format!("node {idx}: feature index {feature} out of range"));
                }
                for child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx}: invalid child index {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}
