//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status returned by the provider
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            400 => Self::new(
                LlmErrorKind::InvalidRequest,
                format!("Invalid request: {message}"),
            ),
            401 | 403 => Self::new(
                LlmErrorKind::Auth,
                format!("Authentication failed: {message}"),
            ),
            429 => Self::new(
                LlmErrorKind::RateLimit,
                format!("Rate limit exceeded: {message}"),
            ),
            500..=599 => Self::new(
                LlmErrorKind::ServerError,
                format!("Server error: {message}"),
            ),
            _ => Self::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

/// Error classification
///
/// Nothing retries; the kind is carried into logs so operators can tell a
/// missing API key from a provider outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403), usually a missing or wrong API key
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Unknown error, including unparseable responses
    Unknown,
}
