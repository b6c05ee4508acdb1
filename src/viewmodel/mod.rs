//! Page View-Models
//!
//! Presentation-independent state and operations for every screen. Each
//! view-model owns its state exclusively and talks to the backend through
//! an injected `Arc<dyn Backend>`.
//!
//! ## Pages
//!
//! - **Inventory / Suppliers**: a plain [`Collection`]
//! - **Sales orders / Purchase orders**: a [`Collection`] plus picker options
//!   and status filters
//! - **Dashboard**: four independent reads with per-section results
//! - **Login / Sign up**: form state around the [`SessionManager`](crate::session::SessionManager)

mod auth;
mod collection;
mod dashboard;
mod error;
mod inventory;
mod purchase_orders;
mod sales_orders;
mod suppliers;

pub use auth::{LoginPage, SignUpPage};
pub use collection::{filter_rows, Collection, Confirm, LoadState};
pub use dashboard::{DashboardPage, ACTIVITY_LIMIT};
pub use error::{ValidationError, ViewError, ViewResult};
pub use inventory::InventoryPage;
pub use purchase_orders::PurchaseOrdersPage;
pub use sales_orders::SalesOrdersPage;
pub use suppliers::SuppliersPage;

use serde::de::DeserializeOwned;

use crate::backend::{Backend, Select};
use collection::decode_rows;

/// Load picker options. Failures are logged and yield `None` so the page
/// keeps whatever options it already had.
pub(crate) async fn load_options<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Select,
) -> Option<Vec<T>> {
    let rows = match backend.select(query).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::debug!(table = %query.table, "Option load failed: {}", e);
            return None;
        }
    };
    match decode_rows(rows) {
        Ok(options) => Some(options),
        Err(e) => {
            tracing::debug!(table = %query.table, "Unreadable options: {}", e);
            None
        }
    }
}
