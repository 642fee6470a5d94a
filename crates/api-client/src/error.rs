//! Error types for authenticated API calls

use identity::AuthError;

/// Errors from the request gateway.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Token acquisition failed; the request was never sent.
    #[error("request preparation failed: {0}")]
    Preparation(#[from] AuthError),

    /// Backend answered 401. The session has already been ended.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for gateway operations.
pub type Result<T> = std::result::Result<T, ApiError>;
