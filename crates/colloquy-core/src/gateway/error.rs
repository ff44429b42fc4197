//! Gateway error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during a model gateway call
///
/// `is_retryable` drives the orchestrator's retry loop: transient failures
/// (rate limits, upstream errors, timeouts, network problems) may be retried
/// with backoff, everything else surfaces immediately.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// Credentials were rejected
    #[error("{provider} rejected the credentials ({status})")]
    Auth { provider: String, status: u16 },

    /// Rate limited
    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Transient upstream failure
    #[error("{provider} API error ({status}): {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    /// The request itself was rejected
    #[error("{provider} rejected the request ({status}): {message}")]
    InvalidRequest {
        provider: String,
        status: u16,
        message: String,
    },

    /// The call did not finish within the configured timeout
    #[error("model call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response arrived but could not be interpreted
    #[error("invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl GatewayError {
    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(provider: impl Into<String>, status: u16) -> Self {
        Self::Auth {
            provider: provider.into(),
            status,
        }
    }

    /// Create a rate limited error
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a transient upstream error
    pub fn upstream(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the orchestrator may retry after this failure
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. }
            | GatewayError::Upstream { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::Http(_) => true,
            GatewayError::MissingApiKey { .. }
            | GatewayError::Auth { .. }
            | GatewayError::InvalidRequest { .. }
            | GatewayError::Json(_)
            | GatewayError::InvalidResponse { .. } => false,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
