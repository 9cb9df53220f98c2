//! Error classification and recovery hints.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Validation,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Storage,
}

/// Structured error body returned by the Plinto API.
///
/// The API answers failures with `{"error": ..., "error_description": ...}`;
/// FastAPI validation failures use `{"detail": ...}` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable code (`error`).
    pub code: Option<String>,
    /// Human-readable description (`error_description`).
    pub description: Option<String>,
    pub request_id: Option<String>,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    SignInAgain,
    FixInput,
    CheckConfiguration,
    IncreaseTimeout,
    ContactSupport,
}
