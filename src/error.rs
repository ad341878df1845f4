use serde_json::Value;
use thiserror::Error;

pub const FALLBACK_MESSAGE: &str = "An error occurred";

/// A client-side validation failure, tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    #[error("forbidden: {detail}")]
    Forbidden { detail: String },

    #[error("not found: {detail}")]
    NotFound { detail: String },

    #[error("request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Normalize into the message shown to the user: the backend's `detail`
    /// when it sent one, the error's own text otherwise.
    pub fn message(&self) -> String {
        let message = match self {
            ApiError::Unauthorized { detail }
            | ApiError::Forbidden { detail }
            | ApiError::NotFound { detail }
            | ApiError::Status { detail, .. } => detail.clone(),
            ApiError::Validation(err) => err.message.clone(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// True when the server rejected our session and the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pull the `detail` out of an error body.
///
/// The backend sends either `{"detail": "..."}` or, for request validation
/// failures, `{"detail": [{"msg": "...", ...}, ...]}`.
pub(crate) fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
