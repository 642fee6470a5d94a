//! Error types for identity provider interactions

/// Errors reported by the identity provider or the token lifecycle.
///
/// `Clone` so scripted providers can hand the same failure out repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("interaction required: {0}")]
    InteractionRequired(String),

    #[error("user cancelled the {0} flow")]
    UserCancelled(String),

    #[error("identity provider unreachable: {0}")]
    Network(String),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("no active account")]
    NoAccount,
}

impl AuthError {
    /// Cancellations are an expected outcome of interactive flows, not faults.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::UserCancelled(_))
    }
}

/// Result alias for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;
