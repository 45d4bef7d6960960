//! Runtime settings.
//!
//! Resolved in three layers, later ones winning: built-in defaults, the
//! optional `user-crud.toml` file, then `APP__<KEY>` environment variables
//! (e.g. `APP__API_URL`). Command-line flags are applied on top by the binary.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "user-crud.toml";
pub const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL the client talks to.
    pub api_url: String,
    /// Address the mock API listens on.
    pub bind_addr: String,
    /// Database file served by the mock API.
    pub db_path: PathBuf,
    /// Where `seed` writes its output.
    pub seed_output: PathBuf,
    /// `_order` sent with list requests.
    pub list_order: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            db_path: PathBuf::from("mock-api/db.json"),
            seed_output: PathBuf::from("mock-api/db.json"),
            list_order: "desc".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads `user-crud.toml` from the working directory (if present) and the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(Path::new(CONFIG_FILE))
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(apply_overrides(settings, |key| std::env::var(key).ok()))
}

/// Applies `APP__<KEY>` values returned by `lookup`.
pub fn apply_overrides(mut settings: Settings, lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
    if let Some(v) = var("API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("DB_PATH") {
        settings.db_path = PathBuf::from(v);
    }
    if let Some(v) = var("SEED_OUTPUT") {
        settings.seed_output = PathBuf::from(v);
    }
    if let Some(v) = var("LIST_ORDER") {
        settings.list_order = v;
    }
    settings
}
