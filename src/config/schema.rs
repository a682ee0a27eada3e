use serde::{Deserialize, Serialize};

pub const DEFAULT_ANYTHINGLLM_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TAG_MODEL: &str = "gemini-2.5-flash";

/// Top-level `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub anythingllm: AnythingLlmConfig,
    pub tagging: TaggingConfig,
    /// `tracing` filter directive, e.g. `"grabby=debug"`. `RUST_LOG` wins.
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnythingLlmConfig {
    /// API root; request paths are appended as `/v1/...`.
    pub base_url: String,
    /// Sent as a bearer token. Leave unset when a reverse proxy adds it.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AnythingLlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANYTHINGLLM_URL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_TAG_MODEL.to_string(),
            temperature: 0.2,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: 60,
        }
    }
}
