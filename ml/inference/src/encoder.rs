//! Categorical label encoders

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::InferenceError;

/// On-disk form of an encoder artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderArtifact {
    /// Vocabulary in code order
    pub classes: Vec<String>,
}

/// Fixed label-to-integer mapping fitted at training time.
///
/// The code of a label is its position in `classes`. The vocabulary is
/// closed: anything not seen during training is rejected.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    field: &'static str,
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build an encoder from its vocabulary.
    pub fn from_classes(field: &'static str, classes: Vec<String>) -> Result<Self, InferenceError> {
        if classes.is_empty() {
            return Err(InferenceError::InvalidModel(format!("{field} encoder has no classes")));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, label) in classes.iter().enumerate() {
            if codes.insert(label.clone(), code).is_some() {
                return Err(InferenceError::InvalidModel(format!(
                    "{field} encoder has duplicate class {label:?}"
                )));
            }
        }

        Ok(Self { field, classes, codes })
    }

    /// Load an encoder artifact from a JSON file.
    pub fn load(field: &'static str, path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let artifact: EncoderArtifact =
            serde_json::from_str(&raw).map_err(|source| InferenceError::Decode {
                path: path.display().to_string(),
                source,
            })?;
        let encoder = Self::from_classes(field, artifact.classes)?;
        tracing::debug!(field, classes = encoder.len(), "loaded label encoder");
        Ok(encoder)
    }

    /// Encode a label.
    pub fn transform(&self, label: &str) -> Result<usize, InferenceError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| InferenceError::UnknownLabel {
                field: self.field,
                label: label.to_string(),
            })
    }

    /// Known labels, in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false for a constructed encoder
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
