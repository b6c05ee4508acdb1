//! Backend error types
//!
//! Errors returned by the identity and data services, plus the message
//! policy used when showing them to the user.

use thiserror::Error;

/// Message shown in place of errors that carry no service message
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors that can occur when talking to the hosted backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// The service answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Identity service rejected the request (bad credentials, duplicate user)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// Could not connect to the backend
    #[error("Backend unavailable")]
    Unavailable,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A single-row read found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session persistence failed
    #[error("Session store error: {0}")]
    Store(String),
}

impl BackendError {
    /// Text to show in the view that triggered the call.
    ///
    /// Service errors are passed through verbatim. Anything we cannot
    /// attribute to the service collapses to [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } | BackendError::Auth(message) => message.clone(),
            BackendError::NotFound(what) => format!("{} not found", what),
            BackendError::Timeout => "Request timed out".to_string(),
            BackendError::Unavailable => "Backend unavailable".to_string(),
            BackendError::Request(_) | BackendError::Decode(_) | BackendError::Store(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Map a reqwest failure onto the timeout/unavailable/request split
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::Unavailable
        } else {
            BackendError::Request(err)
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Store(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_messages_pass_through() {
        let err = BackendError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "duplicate key value violates unique constraint"
        );

        let err = BackendError::Auth("Invalid login credentials".to_string());
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn test_unclassified_errors_are_generic() {
        let err = BackendError::Decode("expected a sequence".to_string());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let err = BackendError::Store("permission denied".to_string());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::Api {
            status: 400,
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "API error 400: bad");
    }
}
