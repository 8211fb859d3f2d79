//! Error types for the portal

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use risk_inference::InferenceError;
use thiserror::Error;

use crate::store::RepositoryError;

/// Portal error type
#[derive(Debug, Error)]
pub enum PortalError {
    /// Malformed form input
    #[error("invalid input: {0}")]
    Validation(String),

    /// Inference failure, including labels outside the encoder vocabulary
    /// and hours outside the day
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// Database failure
    #[error("persistence failed: {0}")]
    Repository(#[from] RepositoryError),

    /// Session token could not be issued
    #[error("session error: {0}")]
    Session(String),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::Validation(_)
            | PortalError::Inference(InferenceError::UnknownLabel { .. })
            | PortalError::Inference(InferenceError::HourOutOfRange(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Bodies stay generic; details only go to the log.
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
