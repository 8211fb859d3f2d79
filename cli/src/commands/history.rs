//! History command

use accident_portal::models::{AdminPredictionRow, PredictionRecord};
use accident_portal::store::{PredictionRepository, UserRepository};
use serde::Serialize;
use tabled::Tabled;

use super::Context;

#[derive(Debug, Serialize, Tabled)]
pub struct HistoryRow {
    pub id: i64,
    pub username: String,
    pub day: String,
    pub hour: u8,
    pub injuries: u32,
    pub location: String,
    pub result: String,
    pub created_at: String,
}

impl HistoryRow {
    fn new(username: &str, record: &PredictionRecord) -> Self {
        Self {
            id: record.id,
            username: username.to_string(),
            day: record.day.clone(),
            hour: record.hour,
            injuries: record.injuries,
            location: record.location.clone(),
            result: record.prediction_result.clone(),
            created_at: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&AdminPredictionRow> for HistoryRow {
    fn from(row: &AdminPredictionRow) -> Self {
        Self::new(&row.username, &row.record)
    }
}

pub async fn handle(username: Option<&str>, limit: u32, ctx: &Context) -> Result<(), String> {
    let store = ctx.open_store().await?;
    let rows = recent(&store, &store, username, limit).await?;
    ctx.format.print(&rows);
    Ok(())
}

/// Newest first; one user's rows when `username` is given, otherwise everyone's.
pub async fn recent(
    users: &dyn UserRepository,
    predictions: &dyn PredictionRepository,
    username: Option<&str>,
    limit: u32,
) -> Result<Vec<HistoryRow>, String> {
    match username {
        Some(name) => {
            let user = users
                .find_by_username(name)
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("No such user: {}", name))?;
            let records =
                predictions.recent_for_user(user.id, limit).await.map_err(|e| e.to_string())?;
            Ok(records.iter().map(|r| HistoryRow::new(&user.username, r)).collect())
        }
        None => {
            let rows = predictions.recent_all(limit).await.map_err(|e| e.to_string())?;
            Ok(rows.iter().map(HistoryRow::from).collect())
        }
    }
}
