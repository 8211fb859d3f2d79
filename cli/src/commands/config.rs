//! Config commands

use std::path::Path;

use colored::Colorize;

use crate::config::{Config, KEYS};
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<(), String> {
    let path = Config::config_path(profile)?;
    match action {
        ConfigCommands::Init => {
            Config::default().save_to(&path)?;
            println!("{} Configuration initialized at {}", "✓".green(), path.display());
        }
        ConfigCommands::Set { key, value } => {
            set_value(&path, &key, value)?;
            println!("{} Set {} successfully", "✓".green(), key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_from(&path)?;
            let value = config.get(&key)?;
            println!("{}: {}", key, value.unwrap_or("(not set)"));
        }
        ConfigCommands::List => {
            let config = Config::load_from(&path)?;
            for key in KEYS {
                println!("{}: {}", key, config.get(key)?.unwrap_or("(not set)"));
            }
        }
    }
    Ok(())
}

/// Update one key in the profile file. An unreadable file is reported, never replaced.
pub fn set_value(path: &Path, key: &str, value: String) -> Result<(), String> {
    if key == "default_format" {
        value.parse::<crate::output::OutputFormat>()?;
    }
    let mut config = Config::load_from(path)
        .map_err(|e| format!("Cannot read {}: {} (fix it or run `config init`)", path.display(), e))?;
    config.set(key, value)?;
    config.save_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_creates_and_updates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_value(&path, "model_dir", "/srv/models".into()).unwrap();
        set_value(&path, "default_format", "json".into()).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.get("model_dir").unwrap(), Some("/srv/models"));
        assert_eq!(config.get("default_format").unwrap(), Some("json"));
    }

    #[test]
    fn test_set_leaves_malformed_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = "database_url = \"sqlite://keep.db\"\nmodel_dir = [unterminated\n";
        std::fs::write(&path, original).unwrap();

        let err = set_value(&path, "default_format", "json".into()).unwrap_err();
        assert!(err.contains("Cannot read"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_set_rejects_bad_format_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(set_value(&path, "default_format", "xml".into()).is_err());
        assert!(!path.exists());
    }
}
