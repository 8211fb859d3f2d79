//! CLI Commands

pub mod config;
pub mod history;
pub mod predict;
pub mod users;

use std::path::PathBuf;

use accident_portal::store::SqliteStore;
use colored::Colorize;
use risk_inference::RiskEngine;

use crate::output::OutputFormat;
use crate::{DEFAULT_DATABASE_URL, DEFAULT_MODEL_DIR};

/// Settings resolved from flags, environment and the profile file
#[derive(Debug)]
pub struct Context {
    pub database_url: String,
    pub model_dir: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    /// Flags and environment win over the profile file, which wins over defaults.
    pub fn resolve(
        database_url: Option<String>,
        model_dir: Option<PathBuf>,
        format: Option<OutputFormat>,
        config: &crate::config::Config,
    ) -> Result<Self, String> {
        let format = match format {
            Some(f) => f,
            None => match &config.default_format {
                Some(name) => name.parse()?,
                None => OutputFormat::default(),
            },
        };

        Ok(Self {
            database_url: database_url
                .or_else(|| config.database_url.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            model_dir: model_dir
                .or_else(|| config.model_dir.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            format,
        })
    }

    /// Open the database and bring the schema up to date.
    pub async fn open_store(&self) -> Result<SqliteStore, String> {
        let store = SqliteStore::connect(&self.database_url).await.map_err(|e| e.to_string())?;
        store.migrate().await.map_err(|e| e.to_string())?;
        Ok(store)
    }

    pub fn load_engine(&self) -> Result<RiskEngine, String> {
        RiskEngine::load(&self.model_dir).map_err(|e| e.to_string())
    }
}

pub async fn migrate(ctx: &Context) -> Result<(), String> {
    ctx.open_store().await?;
    println!("{} Database at {} is up to date", "✓".green(), ctx.database_url);
    Ok(())
}
