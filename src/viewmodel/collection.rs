//! Generic list/CRUD view-model
//!
//! One [`Collection`] backs each table screen. It owns the rows, the loading
//! and error state, and the open form, and re-reads the table after every
//! successful mutation.

use serde_json::Value;
use std::sync::Arc;

use super::{ViewError, ViewResult};
use crate::backend::{Backend, BackendError, BackendResult, Filter};
use crate::models::{Draft, Entity};

/// Where a page is in its load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Interactive yes/no prompt used before destructive operations
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Rows, load state and form state for one entity screen
pub struct Collection<E: Entity> {
    backend: Arc<dyn Backend>,
    rows: Vec<E>,
    state: LoadState,
    error: Option<String>,
    form: Option<E::Draft>,
    search: String,
}

impl<E: Entity> Collection<E> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            rows: Vec::new(),
            state: LoadState::Idle,
            error: None,
            form: None,
            search: String::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Rows in backend order (most recent first for order tables)
    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Re-read the table. Rows are replaced only on success.
    pub async fn refresh(&mut self) -> ViewResult<()> {
        self.state = LoadState::Loading;
        self.error = None;

        let result = self.fetch().await;
        match result {
            Ok(rows) => {
                tracing::debug!(table = E::TABLE, count = rows.len(), "Refreshed");
                self.rows = rows;
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table = E::TABLE, "Refresh failed: {}", e);
                self.state = LoadState::Errored;
                self.fail(e.into())
            }
        }
    }

    async fn fetch(&self) -> BackendResult<Vec<E>> {
        let rows = self.backend.select(&E::select()).await?;
        decode_rows(rows)
    }

    // Form

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.form.as_ref().is_some_and(|f| f.key().is_some())
    }

    pub fn form(&self) -> Option<&E::Draft> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut E::Draft> {
        self.form.as_mut()
    }

    pub fn open_create(&mut self) {
        self.form = Some(E::Draft::default());
    }

    pub fn open_edit(&mut self, row: &E) {
        self.form = Some(row.to_draft());
    }

    /// Open the edit form for the row with `key`; false if it is not loaded
    pub fn open_edit_key(&mut self, key: &E::Key) -> bool {
        match self.rows.iter().find(|row| &row.key() == key) {
            Some(row) => {
                self.form = Some(row.to_draft());
                true
            }
            None => false,
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Validate the open form, then insert or update-by-key and refresh.
    ///
    /// Validation failures make no backend call. The form stays open on any
    /// failure so the user can correct it.
    pub async fn save(&mut self, lookup: &<E::Draft as Draft>::Lookup) -> ViewResult<()> {
        self.error = None;
        let draft = self.form.clone().ok_or(ViewError::NoForm)?;

        let payload = match draft.validate(lookup) {
            Ok(payload) => payload,
            Err(e) => return self.fail(e.into()),
        };
        let row = serde_json::to_value(&payload).map_err(BackendError::from)?;
        let key = draft.key();

        let written = match &key {
            Some(key) => {
                let filter = Filter::eq(E::KEY_COLUMN, key);
                self.backend.update(E::TABLE, &filter, row).await
            }
            None => self.backend.insert(E::TABLE, row).await,
        };
        if let Err(e) = written {
            tracing::warn!(table = E::TABLE, "Save failed: {}", e);
            return self.fail(e.into());
        }

        match &key {
            Some(key) => tracing::info!(table = E::TABLE, key = %key, "Updated row"),
            None => tracing::info!(table = E::TABLE, "Inserted row"),
        }
        self.form = None;
        self.refresh().await
    }

    /// Delete by key after the user confirms. Declining makes no call.
    ///
    /// Returns whether a delete was issued.
    pub async fn remove(&mut self, key: &E::Key, confirm: &dyn Confirm) -> ViewResult<bool> {
        if !confirm.confirm(&format!("Delete this {}?", E::NOUN)) {
            return Ok(false);
        }

        let filter = Filter::eq(E::KEY_COLUMN, key);
        if let Err(e) = self.backend.delete(E::TABLE, &filter).await {
            tracing::warn!(table = E::TABLE, key = %key, "Delete failed: {}", e);
            return self.fail(e.into());
        }

        tracing::info!(table = E::TABLE, key = %key, "Deleted row");
        self.refresh().await?;
        Ok(true)
    }

    fn fail<T>(&mut self, error: ViewError) -> ViewResult<T> {
        self.error = Some(error.user_message());
        Err(error)
    }

    // Search

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Rows matching the current search term
    pub fn filtered(&self) -> Vec<&E> {
        filter_rows(&self.rows, &self.search)
    }
}

/// Case-insensitive substring search. An empty or blank term keeps every row.
pub fn filter_rows<'a, E: Entity>(rows: &'a [E], term: &str) -> Vec<&'a E> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter().filter(|row| row.matches(&needle)).collect()
}

pub(crate) fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> BackendResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}
