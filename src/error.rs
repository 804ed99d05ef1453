// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProteusError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid record target: {0}")]
    InvalidTarget(String),

    #[error("wrong address family: {0}")]
    Type(String),

    #[error("Proteus responded with {status}: {body}")]
    Remote { status: StatusCode, body: String },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("HTTP request failed")]
    Http(#[source] reqwest::Error),

    #[error("unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = ProteusError> = std::result::Result<T, E>;

impl ProteusError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ProteusError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ProteusError::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ProteusError::Config(msg.into())
    }

    pub fn decode(path: &str, reason: impl ToString) -> Self {
        ProteusError::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProteusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // path only; the login query carries the password
            let target = err
                .url()
                .map(|u| u.path().to_string())
                .unwrap_or_else(|| "Proteus".into());
            return ProteusError::Timeout(target);
        }
        ProteusError::Http(err)
    }
}
