use crate::notify::DEFAULT_TOAST_MS;
use crate::storage::TASKS_KEY;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "todo-tui";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub toast_ms: u64,
    pub categories: Vec<String>,
    pub log_file: PathBuf,
}

// Shape of config.toml; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    storage_key: Option<String>,
    toast_ms: Option<u64>,
    categories: Option<Vec<String>>,
    log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Config {
            log_file: data_dir.join(format!("{}.log", APP_DIR)),
            data_dir,
            storage_key: TASKS_KEY.to_string(),
            toast_ms: DEFAULT_TOAST_MS,
            categories: vec![
                "Work".to_string(),
                "Personal".to_string(),
                "Shopping".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Defaults, then the config file, then environment variables.
    pub fn load() -> Result<Config, ConfigError> {
        let mut config = Config::default();
        if let Some(path) = Config::default_path() {
            config.merge_file(&path)?;
        }
        config.merge_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let file: FileConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply(file);
        Ok(())
    }

    fn apply(&mut self, file: FileConfig) {
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(key) = file.storage_key {
            self.storage_key = key;
        }
        if let Some(ms) = file.toast_ms {
            self.toast_ms = ms;
        }
        if let Some(categories) = file.categories {
            self.categories = categories;
        }
        if let Some(log_file) = file.log_file {
            self.log_file = log_file;
        }
    }

    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("TODO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("TODO_STORAGE_KEY") {
            self.storage_key = key;
        }
        if let Some(value) = lookup("TODO_TOAST_MS") {
            self.toast_ms = value.trim().parse().map_err(|_| ConfigError::Env {
                name: "TODO_TOAST_MS",
                value,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage_key, "tasks");
        assert_eq!(config.toast_ms, 3000);
        assert_eq!(config.categories, vec!["Work", "Personal", "Shopping"]);
        assert!(config.data_dir.ends_with("todo-tui"));
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.merge_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/tmp/todos\"\ntoast_ms = 1500\ncategories = [\"Home\", \"Garden\"]\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/todos"));
        assert_eq!(config.toast_ms, 1500);
        assert_eq!(config.categories, vec!["Home", "Garden"]);
        assert_eq!(config.storage_key, "tasks");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "toast_ms = \"soon\"\n").unwrap();

        let err = Config::default().merge_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TODO_DATA_DIR", "/var/todo"),
            ("TODO_STORAGE_KEY", "work-tasks"),
            ("TODO_TOAST_MS", "500"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .merge_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/todo"));
        assert_eq!(config.storage_key, "work-tasks");
        assert_eq!(config.toast_ms, 500);
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let err = Config::default()
            .merge_env(|name| (name == "TODO_TOAST_MS").then(|| "later".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "TODO_TOAST_MS", .. }));
    }
}
