//! Traffic Accident Risk Portal
//!
//! Bilingual (Arabic / English) dashboard for submitting incident attributes
//! to the pre-trained risk model and reviewing past predictions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          PORTAL (axum)                           │
//! │                                                                  │
//! │  request ─► Session cookie ─► CurrentUser / AdminUser guards     │
//! │                                   │                              │
//! │              ┌────────────────────┼─────────────────────┐        │
//! │              ▼                    ▼                     ▼        │
//! │      ┌──────────────┐    ┌────────────────┐    ┌──────────────┐  │
//! │      │  RiskEngine  │    │  Repositories  │    │   Renderer   │  │
//! │      │ (read-only)  │    │ (SQLite pool)  │    │  (ar | en)   │  │
//! │      └──────────────┘    └────────────────┘    └──────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod render;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};
use risk_inference::RiskEngine;
use tower_http::trace::TraceLayer;

use auth::SessionKeys;
use store::{PredictionRepository, UserRepository};

pub use error::PortalError;

/// Row limits for the history views
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Per-user dashboard history
    pub history: u32,
    /// Admin view across all users
    pub admin: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self { history: 50, admin: 200 }
    }
}

/// Shared application state. Everything here is either immutable or
/// internally synchronised, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub predictions: Arc<dyn PredictionRepository>,
    pub engine: Arc<RiskEngine>,
    pub sessions: Arc<SessionKeys>,
    pub limits: Limits,
}

/// Build the portal router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard).post(handlers::submit_prediction))
        .route("/admin", get(handlers::admin))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/lang/:code", get(handlers::set_language))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
