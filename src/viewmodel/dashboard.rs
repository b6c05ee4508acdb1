//! Dashboard view-model
//!
//! Four independent reads issued together. A failing section does not hide
//! the others; the page-level error is the first failure in display order.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::collection::decode_rows;
use crate::backend::{Backend, BackendResult, Order, Select};
use crate::models::{
    ActivityEvent, InventorySummary, PurchaseSummary, SalesSummary, INVENTORY_SUMMARY_VIEW,
    PURCHASE_SUMMARY_VIEW, RECENT_ACTIVITY_VIEW, SALES_SUMMARY_VIEW,
};

/// Number of feed entries shown
pub const ACTIVITY_LIMIT: usize = 10;

/// A section's last load: `None` until the first refresh completes
pub type Section<T> = Option<Result<T, String>>;

pub struct DashboardPage {
    backend: Arc<dyn Backend>,
    loading: bool,
    inventory: Section<InventorySummary>,
    sales: Section<SalesSummary>,
    purchases: Section<PurchaseSummary>,
    activity: Section<Vec<ActivityEvent>>,
}

impl DashboardPage {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            loading: false,
            inventory: None,
            sales: None,
            purchases: None,
            activity: None,
        }
    }

    /// Issue all four reads concurrently and record each outcome
    pub async fn refresh(&mut self) {
        self.loading = true;

        let backend = self.backend.as_ref();
        let activity_query = Select::from(RECENT_ACTIVITY_VIEW)
            .order(Order::desc("occurred_at"))
            .limit(ACTIVITY_LIMIT);

        let (inventory, sales, purchases, activity) = tokio::join!(
            fetch_summary::<InventorySummary>(backend, INVENTORY_SUMMARY_VIEW),
            fetch_summary::<SalesSummary>(backend, SALES_SUMMARY_VIEW),
            fetch_summary::<PurchaseSummary>(backend, PURCHASE_SUMMARY_VIEW),
            fetch_activity(backend, &activity_query),
        );

        self.inventory = Some(section(INVENTORY_SUMMARY_VIEW, inventory));
        self.sales = Some(section(SALES_SUMMARY_VIEW, sales));
        self.purchases = Some(section(PURCHASE_SUMMARY_VIEW, purchases));
        self.activity = Some(section(RECENT_ACTIVITY_VIEW, activity));
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn inventory(&self) -> Option<&Result<InventorySummary, String>> {
        self.inventory.as_ref()
    }

    pub fn sales(&self) -> Option<&Result<SalesSummary, String>> {
        self.sales.as_ref()
    }

    pub fn purchases(&self) -> Option<&Result<PurchaseSummary, String>> {
        self.purchases.as_ref()
    }

    pub fn activity(&self) -> Option<&Result<Vec<ActivityEvent>, String>> {
        self.activity.as_ref()
    }

    /// First failure in the order inventory, sales, purchases, activity
    pub fn error(&self) -> Option<&str> {
        first_error(&self.inventory)
            .or_else(|| first_error(&self.sales))
            .or_else(|| first_error(&self.purchases))
            .or_else(|| first_error(&self.activity))
    }
}

fn first_error<T>(section: &Section<T>) -> Option<&str> {
    match section {
        Some(Err(message)) => Some(message.as_str()),
        _ => None,
    }
}

fn section<T>(view: &str, result: BackendResult<T>) -> Result<T, String> {
    result.map_err(|e| {
        tracing::warn!(view = view, "Dashboard read failed: {}", e);
        e.user_message()
    })
}

/// Read a one-row aggregate view. An empty view reads as all zeros.
async fn fetch_summary<T: DeserializeOwned + Default>(
    backend: &dyn Backend,
    view: &str,
) -> BackendResult<T> {
    let rows = backend.select(&Select::from(view).limit(1)).await?;
    match decode_rows::<T>(rows)?.into_iter().next() {
        Some(summary) => Ok(summary),
        None => {
            tracing::debug!(view = view, "Summary view returned no rows");
            Ok(T::default())
        }
    }
}

async fn fetch_activity(backend: &dyn Backend, query: &Select) -> BackendResult<Vec<ActivityEvent>> {
    let rows = backend.select(query).await?;
    decode_rows(rows)
}
