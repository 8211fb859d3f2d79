//! Persistence
//!
//! Repository seams over the `users` and `predictions` tables:
//! - `SqliteStore` backs the running portal
//! - `InMemoryStore` backs tests and local experiments

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::models::{AdminPredictionRow, NewPrediction, NewUser, PredictionRecord, UserAccount};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// User lookups. Accounts are provisioned out-of-band through the admin CLI.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact, case-sensitive username match
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserAccount>>;

    /// Create an account
    async fn create(&self, user: NewUser) -> RepoResult<UserAccount>;

    /// All accounts, by id
    async fn list(&self) -> RepoResult<Vec<UserAccount>>;
}

/// Prediction history. Rows are append-only.
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// Append one prediction; the owner must exist
    async fn insert(&self, prediction: NewPrediction) -> RepoResult<PredictionRecord>;

    /// Newest first, at most `limit` rows owned by `user_id`
    async fn recent_for_user(&self, user_id: i64, limit: u32) -> RepoResult<Vec<PredictionRecord>>;

    /// Newest first across all users, with owner names
    async fn recent_all(&self, limit: u32) -> RepoResult<Vec<AdminPredictionRow>>;
}
