//! Backend Client
//!
//! The hosted identity + relational-data service, behind one trait so every
//! view-model receives an explicitly constructed handle instead of reaching
//! for a global client.
//!
//! ## Implementations
//!
//! - [`RestBackend`]: HTTPS client for the `/auth/v1` and `/rest/v1` APIs
//! - [`MemoryBackend`]: in-process tables and accounts, records every call
//!
//! Rows cross the trait as `serde_json::Value`; typed decoding happens in the
//! view-models so the trait stays object safe.

mod error;
mod memory;
mod rest;
mod store;

pub use error::{BackendError, BackendResult, GENERIC_ERROR_MESSAGE};
pub use memory::{Call, MemoryBackend, Operation};
pub use rest::{BackendConfig, RestBackend};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::session::{Session, SignUpRequest, SignUpResponse};

/// Common trait for the hosted backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange email/password for a session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Register a new identity with user metadata
    async fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResponse>;

    /// End the current session
    async fn sign_out(&self) -> BackendResult<()>;

    /// The session the service currently holds for us, if any
    async fn session(&self) -> BackendResult<Option<Session>>;

    /// Read rows from a table or view
    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>>;

    /// Insert one row, returning the stored representation
    async fn insert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>>;

    /// Patch every row matching the filter
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Vec<Value>>;

    /// Delete every row matching the filter
    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()>;

    /// Insert or merge on primary key
    async fn upsert(&self, table: &str, row: Value) -> BackendResult<Vec<Value>>;
}

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// `column=eq.value` with the value percent-encoded
    pub fn query_pair(&self) -> String {
        format!(
            "{}=eq.{}",
            urlencoding::encode(&self.column),
            urlencoding::encode(&self.value)
        )
    }
}

/// Sort order for a select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// A read query against one table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    /// Select all columns from a table
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query string in the REST dialect, without the leading `?`
    pub fn query_string(&self) -> String {
        let mut parts = vec![format!("select={}", urlencoding::encode(&self.columns))];
        parts.extend(self.filters.iter().map(Filter::query_pair));
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            parts.push(format!(
                "order={}.{}",
                urlencoding::encode(&order.column),
                direction
            ));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }
        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string() {
        let query = Select::from("products")
            .columns("id,name,price")
            .order(Order::desc("created_at"));
        assert_eq!(
            query.query_string(),
            "select=id%2Cname%2Cprice&order=created_at.desc"
        );
    }

    #[test]
    fn test_query_string_with_filter_and_limit() {
        let query = Select::from("profiles")
            .eq("id", "a b")
            .limit(1);
        assert_eq!(query.query_string(), "select=%2A&id=eq.a%20b&limit=1");
    }

    #[test]
    fn test_filter_pair() {
        let filter = Filter::eq("order_number", 42);
        assert_eq!(filter.query_pair(), "order_number=eq.42");
    }
}
