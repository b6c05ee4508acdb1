//! View-model error types

use thiserror::Error;

use crate::backend::BackendError;

/// A form rejected before any network call. Displays as its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors surfaced by page view-models
#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An operation that needs a signed-in user was called without one
    #[error("Not signed in")]
    NotSignedIn,

    /// `save` was called with no form open
    #[error("No form is open")]
    NoForm,
}

impl ViewError {
    /// Text for the page's error banner
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Validation(e) => e.message().to_string(),
            ViewError::Backend(e) => e.user_message(),
            ViewError::NotSignedIn => "Please sign in to continue".to_string(),
            ViewError::NoForm => "Nothing to save".to_string(),
        }
    }
}

/// Result type alias for view-model operations
pub type ViewResult<T> = Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GENERIC_ERROR_MESSAGE;

    #[test]
    fn test_user_messages() {
        let e: ViewError = ValidationError::new("All fields are required").into();
        assert_eq!(e.user_message(), "All fields are required");

        let e: ViewError = BackendError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".into(),
        }
        .into();
        assert_eq!(e.user_message(), "duplicate key value violates unique constraint");

        let e: ViewError = BackendError::Decode("missing field".into()).into();
        assert_eq!(e.user_message(), GENERIC_ERROR_MESSAGE);
    }
}
