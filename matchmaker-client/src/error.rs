use thiserror::Error;

/// Errors surfaced by the matchmaker client library
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local validation failure, caught before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// Transport-level failure (connection, TLS, body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP response from the backend
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// No session token available for an authenticated endpoint
    #[error("not logged in")]
    Unauthenticated,
}

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
