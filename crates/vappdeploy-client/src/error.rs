//! Error types for the management client

use thiserror::Error;

/// Errors that can occur when talking to the management endpoint
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A request was issued before `login`
    #[error("Not logged in")]
    NotAuthenticated,

    /// Referenced entity or task does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from server
        message: String,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
