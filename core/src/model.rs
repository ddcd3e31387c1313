//! Trained-classifier artifacts.
//!
//! The scoring core treats the classifier as a black box behind the
//! `Classifier` trait. Two artifact formats are understood, both JSON:
//!
//!   - `logistic`:      intercept + one coefficient per encoded slot
//!   - `tree_ensemble`: probability-valued decision trees, averaged
//!
//! RULE: artifacts are loaded once at startup. A missing or malformed
//! artifact is fatal; there is no degraded mode.

use crate::{
    encoder::{EncodedFeatureVector, FeatureScaler, FEATURE_NAMES},
    error::{ChurnError, ChurnResult},
    types::FEATURE_COUNT,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE:     &str = "scaler.json";
pub const METADATA_FILE:   &str = "model_metadata.json";

/// A binary classifier producing the probability of churn.
///
/// Implementations must be side-effect free: one instance is shared by
/// every concurrent caller.
pub trait Classifier: Send + Sync {
    /// Probability of the positive (churn) class for a single vector.
    fn predict_proba(&self, features: &EncodedFeatureVector) -> ChurnResult<f64>;

    /// Exact per-slot contributions to the prediction, when the model
    /// structure allows computing them. `None` means unsupported.
    fn contributions(&self, _features: &EncodedFeatureVector) -> Option<[f64; FEATURE_COUNT]> {
        None
    }
}

// ── Logistic model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub intercept:    f64,
    pub coefficients: Vec<f64>,
    /// Reference point for contributions (training-set mean). Zeros if absent.
    #[serde(default)]
    pub background:   Option<Vec<f64>>,
}

impl LogisticClassifier {
    fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "expected {FEATURE_COUNT} coefficients, found {}",
                self.coefficients.len()
            ));
        }
        if let Some(bg) = &self.background {
            if bg.len() != FEATURE_COUNT {
                return Err(format!("expected {FEATURE_COUNT} background values, found {}", bg.len()));
            }
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("non-finite coefficient".into());
        }
        Ok(())
    }

    fn logit(&self, x: &EncodedFeatureVector) -> f64 {
        self.intercept
            + self.coefficients.iter()
                .zip(x.as_slice())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, features: &EncodedFeatureVector) -> ChurnResult<f64> {
        let z = self.logit(features);
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    /// Log-odds contribution of each slot relative to the background point.
    fn contributions(&self, features: &EncodedFeatureVector) -> Option<[f64; FEATURE_COUNT]> {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            let reference = self.background.as_ref().map_or(0.0, |bg| bg[i]);
            *slot = self.coefficients[i] * (features.0[i] - reference);
        }
        Some(out)
    }
}

// ── Tree ensemble ────────────────────────────────────────────────────────────

/// A node of a binary decision tree. `value` is the mean positive-class
/// probability of the training rows reaching the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
        value:     f64,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn value(&self) -> f64 {
        match self {
            Self::Split { value, .. } | Self::Leaf { value } => *value,
        }
    }
}

/// Nodes are stored flat; node 0 is the root. `x <= threshold` goes left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if !(0.0..=1.0).contains(&node.value()) {
                return Err(format!("node {idx} value {} outside [0,1]", node.value()));
            }
            if let TreeNode::Split { feature, left, right, .. } = node {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {idx} splits on unknown slot {feature}"));
                }
                // Children must come after their parent: rules out cycles.
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Indices of the nodes visited from root to leaf.
    fn path(&self, x: &EncodedFeatureVector) -> Vec<usize> {
        let mut path = vec![0];
        let mut idx = 0;
        while let TreeNode::Split { feature, threshold, left, right, .. } = &self.nodes[idx] {
            idx = if x.0[*feature] <= *threshold { *left } else { *right };
            path.push(idx);
        }
        path
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleClassifier {
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsembleClassifier {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for TreeEnsembleClassifier {
    fn predict_proba(&self, features: &EncodedFeatureVector) -> ChurnResult<f64> {
        let total: f64 = self.trees.iter()
            .map(|tree| {
                let path = tree.path(features);
                tree.nodes[path[path.len() - 1]].value()
            })
            .sum();
        Ok(total / self.trees.len() as f64)
    }

    /// Path attribution: every split credits its feature with the change in
    /// node value it causes. Contributions plus the mean root value sum to
    /// the prediction.
    fn contributions(&self, features: &EncodedFeatureVector) -> Option<[f64; FEATURE_COUNT]> {
        let mut out = [0.0; FEATURE_COUNT];
        for tree in &self.trees {
            let path = tree.path(features);
            for pair in path.windows(2) {
                if let TreeNode::Split { feature, .. } = &tree.nodes[pair[0]] {
                    out[*feature] += tree.nodes[pair[1]].value() - tree.nodes[pair[0]].value();
                }
            }
        }
        let n = self.trees.len() as f64;
        out.iter_mut().for_each(|v| *v /= n);
        Some(out)
    }
}

// ── Artifact files ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Logistic(LogisticClassifier),
    TreeEnsemble(TreeEnsembleClassifier),
}

impl ClassifierArtifact {
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, String> {
        match self {
            Self::Logistic(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
            Self::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub accuracy:   f64,
    pub roc_auc:    f64,
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl ModelMetadata {
    pub fn summary(&self) -> String {
        format!(
            "{} (accuracy {:.4}, ROC-AUC {:.4})",
            self.model_name, self.accuracy, self.roc_auc
        )
    }
}

/// Everything the scoring core needs from the training pipeline.
pub struct ModelArtifacts {
    pub classifier: Arc<dyn Classifier>,
    pub scaler:     FeatureScaler,
    pub metadata:   ModelMetadata,
}

impl ModelArtifacts {
    /// Load classifier, scaler and metadata from `model_dir`.
    pub fn load(model_dir: &Path) -> ChurnResult<Self> {
        let classifier_path = model_dir.join(CLASSIFIER_FILE);
        let artifact: ClassifierArtifact = read_json(&classifier_path)?;
        let classifier = artifact
            .into_classifier()
            .map_err(|reason| artifact_error(&classifier_path, reason))?;

        let scaler_path = model_dir.join(SCALER_FILE);
        let scaler: FeatureScaler = read_json(&scaler_path)?;
        scaler
            .validate()
            .map_err(|e| artifact_error(&scaler_path, e.to_string()))?;

        let metadata: ModelMetadata = read_json(&model_dir.join(METADATA_FILE))?;

        // Feature order is not enforced; a mismatch only gets reported.
        if !metadata.feature_names.is_empty()
            && !metadata.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied())
        {
            log::warn!(
                "model: metadata feature names differ from the encoder schema; predictions may be wrong"
            );
        }

        log::info!("model: loaded {} from {}", metadata.summary(), model_dir.display());

        Ok(Self { classifier, scaler, metadata })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> ChurnResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| artifact_error(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| artifact_error(path, e.to_string()))
}

fn artifact_error(path: &Path, reason: String) -> ChurnError {
    ChurnError::ArtifactLoad {
        path: path.display().to_string(),
        reason,
    }
}
