//! tinypaste.toml configuration parser.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::is_safe_name;

/// Default identifier alphabet: ASCII letters and digits.
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render config: {0}")]
    Render(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Directory holding both paste files and static assets.
    pub data_dir: PathBuf,
    /// Address the HTTP server binds to.
    pub listen: SocketAddr,
    /// Number of characters in a generated identifier.
    pub id_length: usize,
    /// Characters eligible for use in an identifier.
    pub id_alphabet: String,
    /// Form field carrying the submitted text.
    pub form_field: String,
    /// Reserved names served from `data_dir` as static assets.
    pub static_files: Vec<String>,
    /// Asset served for `GET /`.
    pub index_file: String,
    /// Trust `X-Real-IP` / `X-Forwarded-For` when logging client addresses.
    pub real_ip: bool,
    /// Upper bound on identifier candidates tried by a single create.
    pub max_create_attempts: u32,
    /// Largest accepted request body, in bytes.
    pub max_paste_bytes: usize,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            id_length: 5,
            id_alphabet: DEFAULT_ALPHABET.to_string(),
            form_field: "text".to_string(),
            static_files: vec!["index.html".to_string(), "style.css".to_string()],
            index_file: "index.html".to_string(),
            real_ip: false,
            max_create_attempts: 64,
            max_paste_bytes: 2 * 1024 * 1024,
        }
    }
}

impl PasteConfig {
    /// Load a config file. Files ending in `.json` are parsed as JSON,
    /// everything else as TOML. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Render(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Render(e.to_string()))
    }

    /// Check the invariants the store and router rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_length == 0 {
            return Err(ConfigError::Invalid("id_length must be at least 1".into()));
        }
        if self.id_alphabet.is_empty() {
            return Err(ConfigError::Invalid("id_alphabet must not be empty".into()));
        }
        if !is_safe_name(&self.id_alphabet) {
            return Err(ConfigError::Invalid(format!(
                "id_alphabet may only contain [A-Za-z0-9_-], got {:?}",
                self.id_alphabet
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.id_alphabet.chars().find(|c| !seen.insert(*c)) {
            return Err(ConfigError::Invalid(format!(
                "id_alphabet contains {dup:?} more than once"
            )));
        }
        if self.max_create_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_create_attempts must be at least 1".into(),
            ));
        }
        if self.form_field.is_empty() {
            return Err(ConfigError::Invalid("form_field must not be empty".into()));
        }
        if let Some(bad) = self
            .static_files
            .iter()
            .find(|name| name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.'))
        {
            return Err(ConfigError::Invalid(format!(
                "static file {bad:?} must be a plain file name"
            )));
        }
        if !self.static_files.contains(&self.index_file) {
            return Err(ConfigError::Invalid(format!(
                "index_file {:?} is not listed in static_files",
                self.index_file
            )));
        }
        Ok(())
    }

    /// Size of the identifier space, saturating at `u128::MAX`.
    pub fn id_space(&self) -> u128 {
        let base = self.id_alphabet.chars().count() as u128;
        (0..self.id_length).fold(1u128, |acc, _| acc.saturating_mul(base))
    }
}
