//! In-memory repositories (for testing and development)

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{PredictionRepository, RepoResult, RepositoryError, UserRepository};
use crate::models::{AdminPredictionRow, NewPrediction, NewUser, PredictionRecord, UserAccount};

#[derive(Default)]
struct Tables {
    users: Vec<UserAccount>,
    predictions: Vec<PredictionRecord>,
}

/// Both repositories over plain vectors, with the same constraints the
/// SQL schema enforces (unique usernames, existing prediction owners).
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored predictions
    pub fn prediction_count(&self) -> usize {
        self.tables.read().predictions.len()
    }
}

fn newest_first(a: &PredictionRecord, b: &PredictionRecord) -> std::cmp::Ordering {
    (b.created_at, b.id).cmp(&(a.created_at, a.id))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserAccount>> {
        Ok(self
            .tables
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> RepoResult<UserAccount> {
        let mut tables = self.tables.write();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict(format!("username {} taken", user.username)));
        }
        let account = UserAccount {
            id: tables.users.len() as i64 + 1,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            language: user.language,
        };
        tables.users.push(account.clone());
        Ok(account)
    }

    async fn list(&self) -> RepoResult<Vec<UserAccount>> {
        Ok(self.tables.read().users.clone())
    }
}

#[async_trait]
impl PredictionRepository for InMemoryStore {
    async fn insert(&self, prediction: NewPrediction) -> RepoResult<PredictionRecord> {
        let mut tables = self.tables.write();
        if !tables.users.iter().any(|u| u.id == prediction.user_id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} does not exist",
                prediction.user_id
            )));
        }
        let record = PredictionRecord {
            id: tables.predictions.len() as i64 + 1,
            user_id: prediction.user_id,
            prediction_result: prediction.result_string(),
            risk_score: prediction.assessment.score,
            risk_level: prediction.assessment.level,
            day: prediction.incident.day,
            hour: prediction.incident.hour,
            injuries: prediction.incident.injuries,
            location: prediction.incident.location,
            created_at: Utc::now(),
        };
        tables.predictions.push(record.clone());
        Ok(record)
    }

    async fn recent_for_user(&self, user_id: i64, limit: u32) -> RepoResult<Vec<PredictionRecord>> {
        let tables = self.tables.read();
        let mut rows: Vec<_> = tables
            .predictions
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn recent_all(&self, limit: u32) -> RepoResult<Vec<AdminPredictionRow>> {
        let tables = self.tables.read();
        let mut rows: Vec<_> = tables.predictions.clone();
        rows.sort_by(newest_first);
        rows.truncate(limit as usize);
        rows.into_iter()
            .map(|record| {
                let username = tables
                    .users
                    .iter()
                    .find(|u| u.id == record.user_id)
                    .map(|u| u.username.clone())
                    .ok_or_else(|| RepositoryError::NotFound(format!("user {}", record.user_id)))?;
                Ok(AdminPredictionRow { username, record })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use risk_inference::{Incident, RiskAssessment};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            password_hash: "h".into(),
            role: Role::User,
            language: None,
        }
    }

    fn prediction(user_id: i64, score: f64) -> NewPrediction {
        NewPrediction {
            user_id,
            incident: Incident { day: "Monday".into(), hour: 0, injuries: 0, location: "X".into() },
            assessment: RiskAssessment::from_score(score),
        }
    }

    #[tokio::test]
    async fn test_constraints_match_schema() {
        let store = InMemoryStore::new();
        let u = store.create(new_user("amal")).await.unwrap();
        assert!(matches!(store.create(new_user("amal")).await, Err(RepositoryError::Conflict(_))));
        assert!(matches!(store.insert(prediction(u.id + 1, 0.1)).await, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.prediction_count(), 0);
    }

    #[tokio::test]
    async fn test_history_order_and_limit() {
        let store = InMemoryStore::new();
        let u = store.create(new_user("amal")).await.unwrap();
        for score in [0.1, 0.5, 0.9] {
            store.insert(prediction(u.id, score)).await.unwrap();
        }
        let history = store.recent_for_user(u.id, 2).await.unwrap();
        assert_eq!(history.iter().map(|r| r.risk_score).collect::<Vec<_>>(), vec![0.9, 0.5]);

        let all = store.recent_all(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.username == "amal"));
    }
}
