//! Session manager
//!
//! An explicit, owned session object. Whoever needs the session gets a
//! reference or an `Arc` to this; nothing reads session state globally.

use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{Session, SignUpForm, SignUpOutcome, User};
use crate::backend::{Backend, BackendResult, Select};
use crate::format;
use crate::models::Profile;
use crate::viewmodel::{ViewError, ViewResult};

/// Owns the current session and the listener that bootstraps profiles
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    session: watch::Sender<Option<Session>>,
    profile: Arc<watch::Sender<Option<Profile>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (session, _) = watch::channel(None);
        let (profile, _) = watch::channel(None);
        Self {
            backend,
            session,
            profile: Arc::new(profile),
            listener: Mutex::new(None),
        }
    }

    /// Retrieve the current session and start following changes.
    ///
    /// A failure to read the session is logged and treated as signed out.
    pub async fn start(&self) {
        let initial = match self.backend.session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Could not retrieve session: {}", e);
                None
            }
        };

        let rx = self.session.subscribe();
        self.session.send_replace(initial);

        let handle = tokio::spawn(follow_sessions(
            Arc::clone(&self.backend),
            rx,
            Arc::clone(&self.profile),
        ));

        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = listener.replace(handle) {
            previous.abort();
        }
        tracing::debug!("Session listener started");
    }

    /// Stop following session changes
    pub fn stop(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = listener.take() {
            handle.abort();
            tracing::debug!("Session listener stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .map(|l| l.as_ref().map_or(false, |h| !h.is_finished()))
            .unwrap_or(false)
    }

    pub fn current(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profile.borrow().clone()
    }

    /// Session-change notifications
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    /// Profile-change notifications
    pub fn subscribe_profile(&self) -> watch::Receiver<Option<Profile>> {
        self.profile.subscribe()
    }

    /// Name shown in the sidebar
    pub fn display_name(&self) -> String {
        format::display_name(self.profile().as_ref(), self.user().as_ref())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let session = self
            .backend
            .sign_in_with_password(email.trim(), password)
            .await?;
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Validate the form, then register with the identity service
    pub async fn sign_up(&self, form: &SignUpForm) -> ViewResult<SignUpOutcome> {
        let request = form.validate()?;
        let response = self.backend.sign_up(&request).await?;

        match response.session {
            Some(session) => {
                self.session.send_replace(Some(session.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired {
                email: request.email,
            }),
        }
    }

    /// Sign out locally regardless of what the service says
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out().await {
            tracing::warn!("Sign out call failed: {}", e);
        }
        self.session.send_replace(None);
    }

    /// Set the display name on the current user's profile
    pub async fn update_username(&self, username: &str) -> ViewResult<Profile> {
        let user = self.user().ok_or(ViewError::NotSignedIn)?;
        let username = username.trim();
        let username = (!username.is_empty()).then(|| username.to_string());

        let rows = self
            .backend
            .upsert(Profile::TABLE, json!({ "id": user.id, "username": username }))
            .await?;

        let profile = rows
            .into_iter()
            .next()
            .and_then(|row| serde_json::from_value::<Profile>(row).ok())
            .unwrap_or(Profile {
                id: user.id,
                username,
            });

        self.profile.send_replace(Some(profile.clone()));
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(profile)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn follow_sessions(
    backend: Arc<dyn Backend>,
    mut rx: watch::Receiver<Option<Session>>,
    profile: Arc<watch::Sender<Option<Profile>>>,
) {
    let mut last_user: Option<Uuid> = None;

    loop {
        let user = rx.borrow_and_update().as_ref().map(|s| s.user.id);

        if user != last_user {
            let loaded = match user {
                Some(id) => ensure_profile(backend.as_ref(), id).await,
                None => None,
            };
            profile.send_replace(loaded);
            last_user = user;
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Load the profile for `user_id`, creating it with no display name if absent.
///
/// Errors are logged and yield `None`; they never reach the user.
pub async fn ensure_profile(backend: &dyn Backend, user_id: Uuid) -> Option<Profile> {
    let query = Select::from(Profile::TABLE).eq("id", user_id).limit(1);

    let rows = match backend.select(&query).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(user_id = %user_id, "Profile lookup failed: {}", e);
            return None;
        }
    };

    if let Some(row) = rows.into_iter().next() {
        return match serde_json::from_value::<Profile>(row) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::error!(user_id = %user_id, "Unreadable profile row: {}", e);
                None
            }
        };
    }

    match backend
        .insert(Profile::TABLE, json!({ "id": user_id, "username": null }))
        .await
    {
        Ok(rows) => {
            tracing::info!(user_id = %user_id, "Created profile");
            let created = rows
                .into_iter()
                .next()
                .and_then(|row| serde_json::from_value::<Profile>(row).ok());
            Some(created.unwrap_or(Profile {
                id: user_id,
                username: None,
            }))
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, "Profile insert failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Operation};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    const EMAIL: &str = "ops@sunflow.test";
    const PASSWORD: &str = "secret1";

    fn manager_with(backend: Arc<MemoryBackend>) -> SessionManager {
        SessionManager::new(backend)
    }

    async fn wait_for_profile(manager: &SessionManager) -> Profile {
        let mut rx = manager.subscribe_profile();
        let profile = timeout(Duration::from_secs(2), rx.wait_for(|p| p.is_some()))
            .await
            .expect("profile bootstrap timed out")
            .expect("profile channel closed")
            .clone();
        profile.unwrap()
    }

    #[tokio::test]
    async fn test_start_without_session() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = manager_with(backend.clone());

        manager.start().await;
        assert!(manager.is_running());
        assert!(!manager.is_authenticated());
        assert_eq!(manager.display_name(), "User");

        manager.stop();
        assert!(!manager.is_running());
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_profile() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        let manager = manager_with(backend.clone());
        manager.start().await;

        let session = manager.sign_in(EMAIL, PASSWORD).await.unwrap();
        let profile = wait_for_profile(&manager).await;

        assert_eq!(profile.id, session.user.id);
        assert_eq!(profile.username, None);
        assert_eq!(backend.rows("profiles").len(), 1);
        assert_eq!(backend.count(Operation::Insert, Some("profiles")), 1);
        assert_eq!(manager.display_name(), "ops");
    }

    #[tokio::test]
    async fn test_existing_profile_is_loaded_not_duplicated() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        let user_id = backend.user_id(EMAIL).unwrap();
        backend.seed("profiles", vec![json!({ "id": user_id, "username": "Ana" })]);

        let manager = manager_with(backend.clone());
        manager.start().await;
        manager.sign_in(EMAIL, PASSWORD).await.unwrap();

        let profile = wait_for_profile(&manager).await;
        assert_eq!(profile.username.as_deref(), Some("Ana"));
        assert_eq!(backend.count(Operation::Insert, Some("profiles")), 0);
        assert_eq!(manager.display_name(), "Ana");
    }

    #[tokio::test]
    async fn test_profile_errors_do_not_block_sign_in() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        backend.fail("profiles", Operation::Insert, "new row violates row-level security policy");

        let manager = manager_with(backend.clone());
        manager.start().await;
        manager.sign_in(EMAIL, PASSWORD).await.unwrap();

        // Give the listener a chance to run and fail
        let mut rx = manager.subscribe();
        let _ = timeout(Duration::from_millis(50), rx.changed()).await;
        tokio::task::yield_now().await;

        assert!(manager.is_authenticated());
        assert!(manager.profile().is_none());
    }

    #[tokio::test]
    async fn test_existing_session_bootstraps_on_start() {
        let user = User::new(Uuid::new_v4(), EMAIL);
        let session = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
            user: user.clone(),
        };
        let backend = Arc::new(MemoryBackend::new().with_session(session));
        let manager = manager_with(backend.clone());

        manager.start().await;
        assert!(manager.is_authenticated());

        let profile = wait_for_profile(&manager).await;
        assert_eq!(profile.id, user.id);
    }

    #[tokio::test]
    async fn test_sign_out_notifies_subscribers() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        let manager = manager_with(backend.clone());
        manager.start().await;
        manager.sign_in(EMAIL, PASSWORD).await.unwrap();

        let mut rx = manager.subscribe();
        manager.sign_out().await;

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_session_empty() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        let manager = manager_with(backend);
        manager.start().await;

        let err = manager.sign_in(EMAIL, "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_validation_skips_network() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = manager_with(backend.clone());

        let form = SignUpForm {
            email: "new@sunflow.test".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
            ..Default::default()
        };
        let err = manager.sign_up(&form).await.unwrap_err();

        assert_eq!(err.user_message(), "Passwords do not match");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation() {
        let backend = Arc::new(MemoryBackend::new().require_confirmation(true));
        let manager = manager_with(backend.clone());

        let form = SignUpForm {
            email: "new@sunflow.test".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
        };
        let outcome = manager.sign_up(&form).await.unwrap();

        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationRequired {
                email: "new@sunflow.test".to_string()
            }
        );
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_username() {
        let backend = Arc::new(MemoryBackend::new().with_account(EMAIL, PASSWORD));
        let manager = manager_with(backend.clone());

        assert!(matches!(
            manager.update_username("Ana").await,
            Err(ViewError::NotSignedIn)
        ));

        manager.start().await;
        manager.sign_in(EMAIL, PASSWORD).await.unwrap();
        wait_for_profile(&manager).await;

        let profile = manager.update_username("  Ana  ").await.unwrap();
        assert_eq!(profile.username.as_deref(), Some("Ana"));
        assert_eq!(backend.rows("profiles")[0]["username"], "Ana");
        assert_eq!(manager.display_name(), "Ana");
    }
}
