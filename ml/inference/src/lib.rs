//! Traffic Accident Risk Inference
//!
//! Wraps the pre-trained risk regressor and its two label encoders.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      RISK INFERENCE ENGINE                      │
//! │                                                                 │
//! │   day label ──► ┌──────────────┐                                │
//! │                 │ Day Encoder  │──┐                             │
//! │                 └──────────────┘  │   ┌──────────────────────┐  │
//! │   hour ───────────────────────────┼──►│  [day, hour,         │  │
//! │   injuries ───────────────────────┼──►│   injuries, loc]     │  │
//! │                 ┌──────────────┐  │   └──────────┬───────────┘  │
//! │   location ───► │ Loc. Encoder │──┘              │              │
//! │                 └──────────────┘      ┌──────────▼───────────┐  │
//! │                                       │   Risk Regressor     │  │
//! │                                       │ (linear | trees)     │  │
//! │                                       └──────────┬───────────┘  │
//! │                                                  │ score        │
//! │                                       ┌──────────▼───────────┐  │
//! │                                       │ Low | Medium | High  │  │
//! │                                       └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All artifacts are loaded once and never mutated afterwards, so a single
//! [`RiskEngine`] can be shared across threads behind an `Arc`.

#![warn(missing_docs)]

pub mod encoder;
pub mod features;
pub mod inference;
pub mod models;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use encoder::LabelEncoder;
pub use features::{Incident, IncidentFeatures, FEATURE_COUNT};
pub use inference::{RiskAssessment, RiskEngine, MAX_HOUR};
pub use models::{Regressor, RiskModel};

/// Upper bound (inclusive) of the `Low` bucket.
pub const LOW_THRESHOLD: f64 = 0.3;
/// Upper bound (inclusive) of the `Medium` bucket.
pub const MEDIUM_THRESHOLD: f64 = 0.6;

/// Inference error types
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Label outside the encoder vocabulary
    #[error("unknown {field} label: {label:?}")]
    UnknownLabel {
        /// Which encoder rejected the label
        field: &'static str,
        /// The offending label
        label: String,
    },
    /// Artifact could not be read
    #[error("failed to read artifact {path}: {source}")]
    Io {
        /// Artifact path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Artifact could not be decoded
    #[error("failed to decode artifact {path}: {source}")]
    Decode {
        /// Artifact path
        path: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
    /// Artifact decoded but is structurally invalid
    #[error("invalid model: {0}")]
    InvalidModel(String),
    /// Hour of day outside 0-23
    #[error("hour {0} is outside 0-23")]
    HourOutOfRange(u8),
    /// Model produced NaN or infinity
    #[error("model produced a non-finite score: {0}")]
    NonFiniteScore(f64),
}

/// Discrete risk bucket derived from the continuous score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// score <= 0.3
    Low,
    /// 0.3 < score <= 0.6
    Medium,
    /// score > 0.6
    High,
}

impl RiskLevel {
    /// Bucket a score with the fixed thresholds.
    pub fn from_score(score: f64) -> Self {
        if score <= LOW_THRESHOLD {
            RiskLevel::Low
        } else if score <= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Canonical label, as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// All levels, lowest first.
    pub fn all() -> [RiskLevel; 3] {
        [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}
