use reqwest::StatusCode;
use serde_json::Value;

/// Errors from the AnythingLLM REST API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status. `message` is the best human-readable text
    /// the response body offered.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx response whose body reports failure.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self::Http {
            status: status.as_u16(),
            message: extract_error_message(status, body),
        }
    }
}

/// Picks `error`, then `message` from a JSON error body, falling back to
/// `HTTP <code>: <reason>`.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    field("error").or_else(|| field("message")).unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    })
}

/// Errors raised by user-driven session edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No file with id \"{0}\"")]
    UnknownFile(String),

    #[error("File \"{0}\" is not awaiting confirmation")]
    NotEditable(String),

    #[error("Tag \"{tag}\" is not one of the tags of \"{id}\"")]
    TagNotPresent { id: String, tag: String },

    #[error("File \"{0}\" needs a primary tag before it can be selected")]
    NotSelectable(String),

    #[error("A batch embedding is already running")]
    BatchInProgress,
}
