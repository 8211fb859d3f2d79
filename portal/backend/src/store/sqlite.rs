//! SQLite-backed repositories

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use risk_inference::RiskLevel;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{PredictionRepository, RepoResult, RepositoryError, UserRepository};
use crate::i18n::Language;
use crate::models::{
    AdminPredictionRow, NewPrediction, NewUser, PredictionRecord, Role, UserAccount,
};

const PREDICTION_COLUMNS: &str = "id, user_id, day, hour, injuries, location, \
     prediction_result, risk_score, risk_level, created_at";

/// Pool-backed store. Every query checks a connection out of the pool and
/// hands it back when the query future completes or is dropped.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. A single long-lived connection keeps the
    /// database alive for the lifetime of the store.
    pub async fn in_memory() -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(err.to_string()),
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::StorageError(err.to_string()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    role: String,
    language: Option<String>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            role: Role::from_db(&row.role),
            language: row.language.as_deref().and_then(Language::parse),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PredictionRow {
    id: i64,
    user_id: i64,
    day: String,
    hour: i64,
    injuries: i64,
    location: String,
    prediction_result: String,
    risk_score: f64,
    risk_level: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PredictionRow> for PredictionRecord {
    type Error = RepositoryError;

    fn try_from(row: PredictionRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            RepositoryError::StorageError(format!("prediction {}: invalid {what}", row.id))
        };
        Ok(PredictionRecord {
            id: row.id,
            user_id: row.user_id,
            hour: u8::try_from(row.hour).map_err(|_| corrupt("hour"))?,
            injuries: u32::try_from(row.injuries).map_err(|_| corrupt("injuries"))?,
            risk_level: RiskLevel::from_str(&row.risk_level).map_err(|_| corrupt("risk_level"))?,
            day: row.day,
            location: row.location,
            prediction_result: row.prediction_result,
            risk_score: row.risk_score,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    username: String,
    #[sqlx(flatten)]
    prediction: PredictionRow,
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, role, language FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserAccount::from))
    }

    async fn create(&self, user: NewUser) -> RepoResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password, role, language)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, password, role, language
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.language.map(|l| l.code()))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list(&self) -> RepoResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, role, language FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserAccount::from).collect())
    }
}

#[async_trait]
impl PredictionRepository for SqliteStore {
    async fn insert(&self, prediction: NewPrediction) -> RepoResult<PredictionRecord> {
        let sql = format!(
            r#"
            INSERT INTO predictions
            (user_id, day, hour, injuries, location, prediction_result, risk_score, risk_level, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PREDICTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PredictionRow>(&sql)
            .bind(prediction.user_id)
            .bind(&prediction.incident.day)
            .bind(i64::from(prediction.incident.hour))
            .bind(i64::from(prediction.incident.injuries))
            .bind(&prediction.incident.location)
            .bind(prediction.result_string())
            .bind(prediction.assessment.score)
            .bind(prediction.assessment.level.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn recent_for_user(&self, user_id: i64, limit: u32) -> RepoResult<Vec<PredictionRecord>> {
        let sql = format!(
            r#"
            SELECT {PREDICTION_COLUMNS}
            FROM predictions
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#
        );
        let rows = sqlx::query_as::<_, PredictionRow>(&sql)
            .bind(user_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PredictionRecord::try_from).collect()
    }

    async fn recent_all(&self, limit: u32) -> RepoResult<Vec<AdminPredictionRow>> {
        let rows = sqlx::query_as::<_, AdminRow>(
            r#"
            SELECT p.id, p.user_id, p.day, p.hour, p.injuries, p.location,
                   p.prediction_result, p.risk_score, p.risk_level, p.created_at,
                   u.username
            FROM predictions p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(AdminPredictionRow {
                    username: row.username,
                    record: row.prediction.try_into()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_inference::{Incident, RiskAssessment};

    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    async fn user(store: &SqliteStore, name: &str, role: Role) -> UserAccount {
        store
            .create(NewUser {
                username: name.into(),
                password_hash: "sha256$00$00".into(),
                role,
                language: None,
            })
            .await
            .unwrap()
    }

    fn prediction(user_id: i64, score: f64) -> NewPrediction {
        NewPrediction {
            user_id,
            incident: Incident {
                day: "Sunday".into(),
                hour: 14,
                injuries: 2,
                location: "Ring Rd".into(),
            },
            assessment: RiskAssessment::from_score(score),
        }
    }

    #[tokio::test]
    async fn test_user_lookup_is_exact() {
        let store = store().await;
        let created = user(&store, "Alice", Role::Admin).await;

        let found = store.find_by_username("Alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.role.is_admin());
        assert_eq!(found.language, None);
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = store().await;
        user(&store, "bob", Role::User).await;
        let err = store
            .create(NewUser {
                username: "bob".into(),
                password_hash: "x".into(),
                role: Role::User,
                language: Some(Language::En),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_round_trips_result_and_level() {
        let store = store().await;
        let u = user(&store, "carol", Role::User).await;

        let saved = store.insert(prediction(u.id, 0.45)).await.unwrap();
        assert_eq!(saved.prediction_result, "0.45% (Medium)");
        assert_eq!(saved.risk_level, RiskLevel::Medium);
        assert_eq!(saved.hour, 14);

        let history = store.recent_for_user(u.id, 50).await.unwrap();
        assert_eq!(history, vec![saved]);
    }

    #[tokio::test]
    async fn test_insert_requires_existing_user() {
        let store = store().await;
        let err = store.insert(prediction(999, 0.1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_history_is_per_user_newest_first_and_limited() {
        let store = store().await;
        let a = user(&store, "a", Role::User).await;
        let b = user(&store, "b", Role::User).await;

        for i in 0..5 {
            store.insert(prediction(a.id, f64::from(i) / 10.0)).await.unwrap();
        }
        store.insert(prediction(b.id, 0.9)).await.unwrap();

        let history = store.recent_for_user(a.id, 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.user_id == a.id));
        assert!(history.windows(2).all(|w| (w[0].created_at, w[0].id) > (w[1].created_at, w[1].id)));
        assert_eq!(history[0].risk_score, 0.4);
    }

    #[tokio::test]
    async fn test_admin_listing_joins_usernames() {
        let store = store().await;
        let a = user(&store, "dina", Role::User).await;
        let b = user(&store, "root", Role::Admin).await;
        store.insert(prediction(a.id, 0.2)).await.unwrap();
        store.insert(prediction(b.id, 0.8)).await.unwrap();

        let rows = store.recent_all(200).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "root");
        assert_eq!(rows[0].record.risk_level, RiskLevel::High);
        assert_eq!(rows[1].username, "dina");

        assert_eq!(store.recent_all(1).await.unwrap().len(), 1);
    }
}
