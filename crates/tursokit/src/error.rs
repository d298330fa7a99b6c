//! Error types for Turso API operations.
//!
//! Errors are categorized so callers can tell a missing object from a
//! failed call and give appropriate feedback.

use std::fmt;

/// Result type alias for Turso API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout failure (transient).
    Network,
    /// The requested object does not exist.
    NotFound,
    /// Missing, invalid or insufficient API token.
    Auth,
    /// The service rejected the request.
    Api,
    /// Unexpected response body.
    Format,
    /// Local configuration or input problem.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Object not found",
            Self::Auth => "Authentication failed",
            Self::Api => "Request rejected by the Turso API",
            Self::Format => "Unexpected API response",
            Self::Config => "Invalid configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::NotFound => "Verify the organization and object names are correct",
            Self::Auth => "Set TURSO_API_TOKEN or provider.api_token to a valid platform API token",
            Self::Api => "Check the error details returned by the service",
            Self::Format => "The API may have changed; check for a newer release",
            Self::Config => "Check the provider section of your configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur when talking to the Turso API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never got an HTTP answer.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The service answered 404.
    #[error("{resource} not found: {message}")]
    NotFound {
        /// Kind of object that was looked up.
        resource: String,
        /// Message returned by the service.
        message: String,
    },

    /// The service answered with another non-success status.
    #[error("Turso API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message returned by the service.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request input was rejected before sending.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error.
    pub fn not_found(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// HTTP status associated with the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { .. } => ErrorCategory::Network,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Api { status: 401 | 403, .. } => ErrorCategory::Auth,
            Self::Api { .. } => ErrorCategory::Api,
            Self::InvalidResponse(_) => ErrorCategory::Format,
            Self::Config(_) | Self::InvalidInput(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Api.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Config.is_retryable());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(ErrorCategory::Auth.advice().contains("TURSO_API_TOKEN"));
        assert!(!ErrorCategory::Network.advice().is_empty());
    }

    #[test]
    fn test_api_status_categories() {
        let unauthorized = Error::Api {
            status: 401,
            message: "invalid token".to_string(),
        };
        assert_eq!(unauthorized.category(), ErrorCategory::Auth);

        let conflict = Error::Api {
            status: 409,
            message: "database already exists".to_string(),
        };
        assert_eq!(conflict.category(), ErrorCategory::Api);
        assert_eq!(conflict.status(), Some(409));
        assert!(conflict.to_string().contains("already exists"));
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("database", "could not find database with name orders");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().starts_with("database not found"));
    }

    #[test]
    fn test_http_error_is_retryable() {
        let err = Error::http("connection refused", None);
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
