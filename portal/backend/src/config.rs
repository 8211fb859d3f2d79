//! Portal configuration
//!
//! Layered, lowest precedence first: built-in defaults, optional TOML file,
//! `PORTAL__*` environment variables (e.g. `PORTAL__SESSION_SECRET`).

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::Limits;

#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Listen address
    pub bind_addr: String,
    /// sqlx SQLite URL
    pub database_url: String,
    /// Directory holding the model and encoder artifacts
    pub model_dir: PathBuf,
    /// Cookie signing secret; a random one is generated when unset
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub history_limit: u32,
    pub admin_limit: u32,
}

impl PortalConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "127.0.0.1:5000")?
            .set_default("database_url", "sqlite://accident_portal.db")?
            .set_default("model_dir", "models")?
            .set_default("session_ttl_hours", 8_i64)?
            .set_default("history_limit", 50_i64)?
            .set_default("admin_limit", 200_i64)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn limits(&self) -> Limits {
        Limits { history: self.history_limit, admin: self.admin_limit }
    }
}
