//! Login and sign-up screens

use crate::router::{Navigator, Route};
use crate::session::{SessionManager, SignUpForm, SignUpOutcome};

/// Email/password login form
#[derive(Debug, Default)]
pub struct LoginPage {
    pub email: String,
    pub password: String,
    loading: bool,
    error: Option<String>,
}

impl LoginPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sign in and move to the dashboard. Returns whether sign-in succeeded.
    pub async fn submit(&mut self, session: &SessionManager, navigator: &mut Navigator) -> bool {
        self.loading = true;
        self.error = None;

        let result = session.sign_in(&self.email, &self.password).await;
        self.loading = false;

        match result {
            Ok(_) => {
                navigator.navigate(Route::Dashboard.path(), true);
                true
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.error = Some(e.user_message());
                false
            }
        }
    }
}

/// Registration form
#[derive(Debug, Default)]
pub struct SignUpPage {
    pub form: SignUpForm,
    loading: bool,
    error: Option<String>,
    /// Set when the service asked the user to confirm their email
    confirmation_sent_to: Option<String>,
}

impl SignUpPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn confirmation_sent_to(&self) -> Option<&str> {
        self.confirmation_sent_to.as_deref()
    }

    /// Register. Validation errors make no network call. A sign-up that
    /// returns a session goes straight to the dashboard; otherwise the page
    /// stays put and shows the confirmation notice.
    pub async fn submit(
        &mut self,
        session: &SessionManager,
        navigator: &mut Navigator,
    ) -> Option<SignUpOutcome> {
        self.loading = true;
        self.error = None;

        let result = session.sign_up(&self.form).await;
        self.loading = false;

        match result {
            Ok(outcome) => {
                match &outcome {
                    SignUpOutcome::SignedIn(_) => {
                        navigator.navigate(Route::Dashboard.path(), true);
                    }
                    SignUpOutcome::ConfirmationRequired { email } => {
                        tracing::info!(email = %email, "Sign-up awaiting email confirmation");
                        self.confirmation_sent_to = Some(email.clone());
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                None
            }
        }
    }
}
