use thiserror::Error;

use crate::error::PlintoError;

/// Errors raised by token storage, JWT decoding and JWKS verification.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),
    #[error("Token verification failed: {0}")]
    Verification(String),
    #[error("Signing key not found: {0}")]
    KeyNotFound(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for PlintoError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Io(msg) => PlintoError::Storage(msg),
            other => PlintoError::Authentication(other.to_string()),
        }
    }
}
