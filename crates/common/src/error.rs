//! Configuration and loading errors shared by every crate that reads settings

use thiserror::Error;

/// Error raised while resolving configuration from files or the environment
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable {name} is invalid: {message}")]
    Env { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Shorthand for an environment variable that failed to parse.
    pub fn env(name: &str, message: impl Into<String>) -> Self {
        Self::Env {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
