//! Session Management
//!
//! Tracks the authenticated identity for the lifetime of the application
//! and guarantees a profile row exists for it.
//!
//! ## Lifecycle
//!
//! 1. [`SessionManager::start`] reads whatever session the backend holds
//! 2. A listener task follows every session change
//! 3. On each transition to a signed-in user it loads or creates the profile
//! 4. [`SessionManager::stop`] ends the listener

mod manager;
mod types;

pub use manager::{ensure_profile, SessionManager};
pub use types::{
    Session, SignUpForm, SignUpOutcome, SignUpRequest, SignUpResponse, User, MIN_PASSWORD_LEN,
};
