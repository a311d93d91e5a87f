use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Not signed in or session expired")]
    Unauthorized,
    #[error("Permission denied: {message}")]
    Forbidden { message: String },
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("Conflict: {message}")]
    Conflict { message: String },
    #[error("Too many requests, slow down and retry")]
    RateLimited,
    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail", alias = "error")]
    message: Option<String>,
}

impl ApiError {
    /// Map a non-success HTTP response to an error, pulling the message out
    /// of the usual `{"message": ..}` / `{"detail": ..}` / `{"error": ..}` bodies.
    pub fn from_status(status: u16, body: &str, resource: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status}")
                } else {
                    trimmed.chars().take(200).collect()
                }
            });

        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound {
                resource: resource.to_string(),
            },
            409 => ApiError::Conflict { message },
            429 => ApiError::RateLimited,
            _ => ApiError::Status { status, message },
        }
    }

    /// One-line suggestion shown under the error in the terminal.
    pub fn hint(&self) -> &'static str {
        match self {
            ApiError::InvalidUrl { .. } => "Set backend.base_url in deskflow.toml or DESKFLOW_BACKEND__BASE_URL",
            ApiError::Network(_) | ApiError::Timeout => "Check that the backend is reachable, then retry",
            ApiError::Unauthorized => "Export a fresh token: export DESKFLOW_TOKEN=...",
            ApiError::Forbidden { .. } => "Your role may not perform this action; check session.role",
            ApiError::NotFound { .. } => "The item may have been deleted; refresh the list",
            ApiError::Conflict { .. } => "Someone else changed this item; refresh and review again",
            ApiError::RateLimited => "Wait a moment before retrying",
            ApiError::Status { .. } => "Retry; if it persists, report it to the backend team",
            ApiError::Decode(_) => "Client and backend versions may be out of sync",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
