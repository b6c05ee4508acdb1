//! Identity types shared by the session manager and the backend client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::viewmodel::ValidationError;

/// Seconds before the stated expiry at which a session counts as expired
const EXPIRY_LEEWAY_SECS: i64 = 10;

/// Minimum password length accepted by the sign-up form
pub const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity as reported by the identity service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,
}

impl User {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            user_metadata: HashMap::new(),
        }
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|at| now.timestamp() >= at - EXPIRY_LEEWAY_SECS)
            .unwrap_or(false)
    }
}

/// Body of a sign-up call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Stored by the service as user metadata
    pub data: HashMap<String, String>,
}

/// What the identity service returned for a sign-up
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpResponse {
    pub user: Option<User>,
    /// Absent when the service requires email confirmation first
    pub session: Option<Session>,
}

/// Outcome of a successful sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Signed in immediately
    SignedIn(Session),
    /// A confirmation link was sent to this address
    ConfirmationRequired { email: String },
}

/// Sign-up form as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignUpForm {
    /// Check the form and build the request; no network involved
    pub fn validate(&self) -> Result<SignUpRequest, ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::new("Passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "Password must be at least 6 characters long",
            ));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::new("Please provide an email address"));
        }

        let mut data = HashMap::new();
        data.insert("first_name".to_string(), self.first_name.trim().to_string());
        data.insert("last_name".to_string(), self.last_name.trim().to_string());

        Ok(SignUpRequest {
            email: email.to_string(),
            password: self.password.clone(),
            data,
        })
    }
}
