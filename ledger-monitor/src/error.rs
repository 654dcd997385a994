use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single request/response exchange with the server API.
///
/// Every variant is contained at the component that issued the request: a probe turns
/// it into an error-state report, an admin action turns it into a notification.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server responded with status: {status}")]
    Http { status: u16 },

    #[error("malformed response body: {reason}")]
    Decode { reason: String, raw: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("invalid request url: {0}")]
    Url(String),
}

impl FetchError {
    /// Short user-facing message for this failure.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) => "Connection error".to_string(),
            FetchError::Http { status } => http_status_message(*status),
            FetchError::Decode { .. } => "Invalid response".to_string(),
            FetchError::Rejected { message } => message.clone(),
            FetchError::Url(_) => "Invalid request".to_string(),
        }
    }

    /// Determine if the failure is an authentication problem the user must fix.
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Http { status: 401 | 403 })
    }
}

/// Map a non-2xx HTTP status code to its user-facing message.
pub fn http_status_message(status: u16) -> String {
    match status {
        400 => "Invalid request".to_string(),
        401 | 403 => "Authentication required".to_string(),
        404 => "Service API not found".to_string(),
        500 => "Service error".to_string(),
        503 => "Service unavailable".to_string(),
        other => format!("Error ({other})"),
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
            },
            None => Self::Transport(value.to_string()),
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(value: url::ParseError) -> Self {
        Self::Url(value.to_string())
    }
}

/// Failure reading one credential store. Never surfaced past the accessor.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read {store}: {source}")]
    Io {
        store: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{store} is unreadable: {reason}")]
    Corrupt { store: &'static str, reason: String },
}

/// Analytics payload that could not be used.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("analytics payload is not a json object")]
    NotAnObject,
}

/// Invalid configuration value supplied through the environment.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid url: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a positive number of milliseconds, got: {value}")]
    InvalidDuration { var: &'static str, value: String },
}
