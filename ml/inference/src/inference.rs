//! Inference Engine

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    encoder::LabelEncoder,
    features::{Incident, IncidentFeatures},
    models::{Regressor, RiskModel},
    InferenceError, RiskLevel,
};

/// Artifact file names inside a model directory.
pub const MODEL_FILE: &str = "risk_model.json";
/// Day encoder artifact
pub const DAY_ENCODER_FILE: &str = "encoder_day.json";
/// Location encoder artifact
pub const LOCATION_ENCODER_FILE: &str = "encoder_location.json";

/// Last valid hour of day.
pub const MAX_HOUR: u8 = 23;

/// Score and bucket for one incident
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Raw model output
    pub score: f64,
    /// Bucketed level
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// Bucket a raw score.
    pub fn from_score(score: f64) -> Self {
        Self { score, level: RiskLevel::from_score(score) }
    }

    /// Display string persisted with each prediction: `"<score>% (<level>)"`.
    pub fn result_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% ({})", self.score, self.level)
    }
}

/// Loaded model plus encoders. Immutable once built.
pub struct RiskEngine {
    model: RiskModel,
    day_encoder: LabelEncoder,
    location_encoder: LabelEncoder,
}

impl RiskEngine {
    /// Assemble an engine from already-loaded parts. The model is validated
    /// here as well as on load, since its fields are public.
    pub fn new(
        model: RiskModel,
        day_encoder: LabelEncoder,
        location_encoder: LabelEncoder,
    ) -> Result<Self, InferenceError> {
        model.validate()?;
        Ok(Self { model, day_encoder, location_encoder })
    }

    /// Load the three artifacts from a model directory.
    pub fn load(dir: &Path) -> Result<Self, InferenceError> {
        tracing::info!("Loading risk model from {}", dir.display());
        let model = RiskModel::load(&dir.join(MODEL_FILE))?;
        let day_encoder = LabelEncoder::load("day", &dir.join(DAY_ENCODER_FILE))?;
        let location_encoder = LabelEncoder::load("location", &dir.join(LOCATION_ENCODER_FILE))?;
        tracing::info!(
            model = %model.describe(),
            days = day_encoder.len(),
            locations = location_encoder.len(),
            "Risk model loaded"
        );
        Self::new(model, day_encoder, location_encoder)
    }

    /// Check the hour and encode the categorical attributes.
    pub fn encode(&self, incident: &Incident) -> Result<IncidentFeatures, InferenceError> {
        if incident.hour > MAX_HOUR {
            return Err(InferenceError::HourOutOfRange(incident.hour));
        }
        Ok(IncidentFeatures {
            day_code: self.day_encoder.transform(&incident.day)?,
            hour: incident.hour,
            injuries: incident.injuries,
            location_code: self.location_encoder.transform(&incident.location)?,
        })
    }

    /// Score an incident and bucket the result.
    pub fn predict_risk(&self, incident: &Incident) -> Result<RiskAssessment, InferenceError> {
        let features = self.encode(incident)?;
        let score = self.model.predict(features.to_vector().view());
        if !score.is_finite() {
            return Err(InferenceError::NonFiniteScore(score));
        }
        Ok(RiskAssessment::from_score(score))
    }

    /// Day labels the model understands
    pub fn known_days(&self) -> &[String] {
        self.day_encoder.classes()
    }

    /// Location labels the model understands
    pub fn known_locations(&self) -> &[String] {
        self.location_encoder.classes()
    }
}
