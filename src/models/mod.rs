//! Data Model
//!
//! Mirrors of the backend's rows, limited to the fields the screens show or
//! edit, plus the form drafts that produce write payloads.
//!
//! The backend owns every entity. Nothing here is authoritative; view-models
//! re-read after each mutation.

mod activity;
mod product;
mod profile;
mod purchase_order;
mod sales_order;
mod summary;
mod supplier;

pub use activity::{ActivityEvent, ActivityKind, RECENT_ACTIVITY_VIEW};
pub use product::{Product, ProductDraft, ProductOption, ProductPayload, StockLevel};
pub use profile::Profile;
pub use purchase_order::{
    PurchaseLookup, PurchaseOrder, PurchaseOrderDraft, PurchaseOrderPayload, PurchaseStatus,
};
pub use sales_order::{SalesOrder, SalesOrderDraft, SalesOrderPayload, SalesStatus};
pub use summary::{
    InventorySummary, PurchaseSummary, SalesSummary, INVENTORY_SUMMARY_VIEW,
    PURCHASE_SUMMARY_VIEW, SALES_SUMMARY_VIEW,
};
pub use supplier::{Supplier, SupplierDraft, SupplierOption, SupplierPayload};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::backend::Select;
use crate::viewmodel::ValidationError;

/// A backend row managed by one CRUD screen
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type
    type Key: Clone + PartialEq + fmt::Display + fmt::Debug + Send + Sync;

    /// Form state used to create or edit this entity
    type Draft: Draft<Key = Self::Key>;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    /// Word used in the delete confirmation ("Delete this product?")
    const NOUN: &'static str;

    /// The read issued on every refresh
    fn select() -> Select;

    fn key(&self) -> Self::Key;

    /// Case-insensitive search; `needle` is already lowercase
    fn matches(&self, needle: &str) -> bool;

    /// Copy the row into an edit form
    fn to_draft(&self) -> Self::Draft;
}

/// An editable form. `Default` is the empty "create" form.
pub trait Draft: Clone + Default + fmt::Debug + Send + Sync {
    type Key;

    /// Reference data needed to build the payload (e.g. names to copy)
    type Lookup: ?Sized + Sync;

    type Payload: Serialize;

    /// `Some` when editing an existing row
    fn key(&self) -> Option<Self::Key>;

    /// Check the form and build the write payload; never touches the network
    fn validate(&self, lookup: &Self::Lookup) -> Result<Self::Payload, ValidationError>;
}

/// Two-state filter over a status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> StatusFilter<T> {
    pub fn allows(&self, status: &T) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl<T: std::str::FromStr> std::str::FromStr for StatusFilter<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Treat `null` like a missing field
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a numeric form field; blank and non-finite input is rejected
pub(crate) fn parse_number(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a whole-number form field ("3" and "3.0" are both 3)
pub(crate) fn parse_count(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = parse_number(trimmed)?;
    (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then(|| value as i64)
}

/// Lowercased substring test
pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
