//! Session persistence
//!
//! The backend client keeps the session between runs on the caller's
//! behalf. The rest of the application never reads these stores directly.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{BackendError, BackendResult};
use crate::session::Session;

/// Where the backend client keeps the current session
pub trait SessionStore: Send + Sync {
    fn load(&self) -> BackendResult<Option<Session>>;
    fn save(&self, session: &Session) -> BackendResult<()>;
    fn clear(&self) -> BackendResult<()>;
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/sunflow/session.json`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("sunflow").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("./sunflow_session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> BackendResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Discarding unreadable session file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> BackendResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> BackendResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, forgotten on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> BackendResult<Option<Session>> {
        let guard = self
            .session
            .lock()
            .map_err(|e| BackendError::Store(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> BackendResult<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| BackendError::Store(e.to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> BackendResult<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| BackendError::Store(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::User;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1_900_000_000),
            user: User::new(Uuid::new_v4(), "ops@sunflow.test"),
        }
    }

    #[test]
    fn test_file_store_persists_and_clears() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        let session = session();
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&session()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
