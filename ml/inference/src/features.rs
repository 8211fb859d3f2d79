//! Feature Assembly

use ndarray::{array, Array1};
use serde::{Deserialize, Serialize};

/// Width of the model input vector.
pub const FEATURE_COUNT: usize = 4;

/// Raw incident attributes as submitted by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Day label (must be known to the day encoder)
    pub day: String,
    /// Hour of day, 0-23
    pub hour: u8,
    /// Number of injuries
    pub injuries: u32,
    /// Location / road label (must be known to the location encoder)
    pub location: String,
}

/// Encoded model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentFeatures {
    /// Encoded day
    pub day_code: usize,
    /// Hour of day
    pub hour: u8,
    /// Number of injuries
    pub injuries: u32,
    /// Encoded location
    pub location_code: usize,
}

impl IncidentFeatures {
    /// Convert to feature vector, in training column order:
    /// `[day_code, hour, injuries, location_code]`.
    pub fn to_vector(&self) -> Array1<f64> {
        array![
            self.day_code as f64,
            f64::from(self.hour),
            f64::from(self.injuries),
            self.location_code as f64,
        ]
    }
}
