//! Error types for the PierceFlare client
//!
//! This module defines all error types used throughout the workspace.
//! Whether an error is fatal is decided by the caller: one-shot mode
//! propagates every error to the process exit code, continuous mode logs
//! and retries on the next tick.

use thiserror::Error;

/// Result type alias for PierceFlare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the PierceFlare client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every IP-echo service failed or returned an invalid payload
    #[error("No valid IP address found after querying {attempts} service(s)")]
    NoAddressFound {
        /// Number of services that were queried
        attempts: usize,
    },

    /// Transport-level HTTP errors (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx answer from the PierceFlare API
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// `errCode` from the structured error body, if any
        err_code: Option<String>,
        /// Server message or body snippet
        message: String,
    },

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an API error from a non-2xx response
    pub fn api(status: u16, err_code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            err_code,
            message: message.into(),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(500, Some("UNRESOLVABLE".into()), "Remote IP unresolvable");
        assert_eq!(err.to_string(), "API error (HTTP 500): Remote IP unresolvable");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_no_address_found_display() {
        let err = Error::NoAddressFound { attempts: 3 };
        assert!(err.to_string().contains("3 service(s)"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_every_kind_has_a_producer() {
        // Exhaustive on purpose: a new kind must come with a constructor here
        let json = serde_json::from_str::<u8>("x").unwrap_err();
        let kinds = [
            Error::config("missing token"),
            Error::NoAddressFound { attempts: 3 },
            Error::http("connection refused"),
            Error::api(500, None, "boom"),
            Error::auth("HTTP 401"),
            Error::rate_limited("HTTP 429"),
            Error::from(json),
        ];

        for kind in &kinds {
            let expected = match kind {
                Error::Api { status, .. } => Some(*status),
                Error::Config(_)
                | Error::NoAddressFound { .. }
                | Error::Http(_)
                | Error::Authentication(_)
                | Error::RateLimited(_)
                | Error::Json(_) => None,
            };
            assert_eq!(kind.status(), expected);
        }
    }
}
