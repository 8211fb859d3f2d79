//! Data Models

use chrono::{DateTime, Utc};
use risk_inference::{Incident, RiskAssessment, RiskLevel};
use serde::{Deserialize, Serialize};

use crate::i18n::Language;

// ============ Users ============

/// User role. Only `admin` is special; every other stored value is a
/// regular user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn from_db(value: &str) -> Self {
        if value == "admin" {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Stored user account
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub language: Option<Language>,
}

/// User creation input (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub language: Option<Language>,
}

// ============ Predictions ============

/// One persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub user_id: i64,
    pub day: String,
    pub hour: u8,
    pub injuries: u32,
    pub location: String,
    /// `"<score>% (<level>)"`
    pub prediction_result: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

/// Prediction insert input
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub incident: Incident,
    pub assessment: RiskAssessment,
}

impl NewPrediction {
    pub fn result_string(&self) -> String {
        self.assessment.result_string()
    }
}

/// Prediction joined with its owner, for the admin view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminPredictionRow {
    pub username: String,
    #[serde(flatten)]
    pub record: PredictionRecord,
}

// ============ Statistics ============

/// Level counts over a history window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskStats {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub total: u64,
}

impl RiskStats {
    /// Count levels from scratch.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PredictionRecord>,
    {
        let mut stats = Self::default();
        for record in records {
            match record.risk_level {
                RiskLevel::Low => stats.low += 1,
                RiskLevel::Medium => stats.medium += 1,
                RiskLevel::High => stats.high += 1,
            }
        }
        stats.total = stats.low + stats.medium + stats.high;
        stats
    }

    pub fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }

    /// Share of `level` in percent, 0 when there is no history.
    pub fn percent(&self, level: RiskLevel) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(level) as f64 * 100.0 / self.total as f64
        }
    }
}
