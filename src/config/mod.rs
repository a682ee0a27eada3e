//! Configuration loading.
//!
//! Reads `config.toml` from the platform config directory (or an explicit
//! path), then applies environment overrides.

pub mod schema;

pub use schema::{AnythingLlmConfig, Config, TaggingConfig};

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const ENV_ANYTHINGLLM_URL: &str = "GRABBY_ANYTHINGLLM_URL";
pub const ENV_ANYTHINGLLM_API_KEY: &str = "GRABBY_ANYTHINGLLM_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// `<config_dir>/grabby/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "grabby").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load from `path` (tilde-expanded) or the default location. A missing
    /// file yields defaults; environment overrides are applied either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(PathBuf::from(
                shellexpand::tilde(&p.to_string_lossy()).to_string(),
            )),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(&p)?,
            Some(p) => {
                tracing::debug!(path = %p.display(), "no config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Overlay values from the environment. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_ANYTHINGLLM_URL) {
            self.anythingllm.base_url = url;
        }
        if let Some(key) = get(ENV_ANYTHINGLLM_API_KEY) {
            self.anythingllm.api_key = Some(key);
        }
        if let Some(key) = get(ENV_GEMINI_API_KEY) {
            self.tagging.api_key = Some(key);
        }
    }
}
