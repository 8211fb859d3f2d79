//! CLI Configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by `config set` / `config get`
pub const KEYS: [&str; 3] = ["database_url", "model_dir", "default_format"];

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub model_dir: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, content).map_err(|e| e.to_string())
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>, String> {
        let value = match key {
            "database_url" => &self.database_url,
            "model_dir" => &self.model_dir,
            "default_format" => &self.default_format,
            _ => return Err(format!("Unknown config key: {}", key)),
        };
        Ok(value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), String> {
        let slot = match key {
            "database_url" => &mut self.database_url,
            "model_dir" => &mut self.model_dir,
            "default_format" => &mut self.default_format,
            _ => return Err(format!("Unknown config key: {}", key)),
        };
        *slot = Some(value);
        Ok(())
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".accident-portal").join(filename))
    }
}
