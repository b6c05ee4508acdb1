use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{contains_ci, nullable, parse_count, Draft, Entity, ProductOption};
use crate::backend::{Order, Select};
use crate::viewmodel::ValidationError;

const INVALID_ORDER: &str = "Please provide valid email, product, and quantity > 0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SalesStatus {
    #[default]
    New,
    Confirmed,
    Shipped,
    Delivered,
}

impl SalesStatus {
    pub const ALL: [SalesStatus; 4] = [
        SalesStatus::New,
        SalesStatus::Confirmed,
        SalesStatus::Shipped,
        SalesStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesStatus::New => "new",
            SalesStatus::Confirmed => "confirmed",
            SalesStatus::Shipped => "shipped",
            SalesStatus::Delivered => "delivered",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesStatus::New => "New",
            SalesStatus::Confirmed => "Confirmed",
            SalesStatus::Shipped => "Shipped",
            SalesStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for SalesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SalesStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::new(format!("Unknown order status: {}", s)))
    }
}

/// A customer order. Keyed by the backend-assigned order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub order_number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub customer_email: String,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    /// Copied from the product when the order was written
    #[serde(default, deserialize_with = "nullable")]
    pub product_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub status: SalesStatus,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SalesOrder {
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.order_date.or(self.created_at)
    }
}

impl Entity for SalesOrder {
    type Key = i64;
    type Draft = SalesOrderDraft;

    const TABLE: &'static str = "sales_orders";
    const KEY_COLUMN: &'static str = "order_number";
    const NOUN: &'static str = "order";

    fn select() -> Select {
        Select::from(Self::TABLE).order(Order::desc("created_at"))
    }

    fn key(&self) -> i64 {
        self.order_number
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.customer_email, needle)
    }

    fn to_draft(&self) -> SalesOrderDraft {
        SalesOrderDraft {
            order_number: Some(self.order_number),
            customer_email: self.customer_email.clone(),
            product_id: self.product_id.map(|id| id.to_string()).unwrap_or_default(),
            product_name: self.product_name.clone(),
            quantity: self.quantity.to_string(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesOrderDraft {
    pub order_number: Option<i64>,
    pub customer_email: String,
    pub product_id: String,
    /// Name carried over from the row being edited
    pub product_name: String,
    pub quantity: String,
    pub status: SalesStatus,
}

impl Default for SalesOrderDraft {
    fn default() -> Self {
        Self {
            order_number: None,
            customer_email: String::new(),
            product_id: String::new(),
            product_name: String::new(),
            quantity: "1".to_string(),
            status: SalesStatus::New,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesOrderPayload {
    pub customer_email: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub status: SalesStatus,
}

impl Draft for SalesOrderDraft {
    type Key = i64;
    type Lookup = [ProductOption];
    type Payload = SalesOrderPayload;

    fn key(&self) -> Option<i64> {
        self.order_number
    }

    fn validate(&self, products: &[ProductOption]) -> Result<SalesOrderPayload, ValidationError> {
        let email = self.customer_email.trim();
        let product_id = Uuid::parse_str(self.product_id.trim()).ok();
        let quantity = parse_count(&self.quantity).filter(|q| *q > 0);

        let (Some(product_id), Some(quantity)) = (product_id, quantity) else {
            return Err(ValidationError::new(INVALID_ORDER));
        };
        if !looks_like_email(email) {
            return Err(ValidationError::new(INVALID_ORDER));
        }

        let product_name = products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| self.product_name.clone());

        Ok(SalesOrderPayload {
            customer_email: email.to_string(),
            product_id,
            product_name,
            quantity,
            status: self.status,
        })
    }
}

/// Minimal shape check: something@something.something
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ProductOption {
        ProductOption {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            price: None,
        }
    }

    #[test]
    fn test_default_draft() {
        let draft = SalesOrderDraft::default();
        assert_eq!(draft.quantity, "1");
        assert_eq!(draft.status, SalesStatus::New);
        assert_eq!(draft.key(), None);
    }

    #[test]
    fn test_validate_copies_product_name() {
        let product = widget();
        let draft = SalesOrderDraft {
            customer_email: "a@b.co".into(),
            product_id: product.id.to_string(),
            quantity: "2".into(),
            ..Default::default()
        };
        let payload = draft.validate(std::slice::from_ref(&product)).unwrap();
        assert_eq!(payload.product_name, "Widget");
        assert_eq!(payload.product_id, product.id);
        assert_eq!(payload.quantity, 2);
    }

    #[test]
    fn test_invalid_orders() {
        let product = widget();
        let base = SalesOrderDraft {
            customer_email: "a@b.co".into(),
            product_id: product.id.to_string(),
            quantity: "1".into(),
            ..Default::default()
        };

        let cases = [
            SalesOrderDraft { customer_email: "not-an-email".into(), ..base.clone() },
            SalesOrderDraft { customer_email: "".into(), ..base.clone() },
            SalesOrderDraft { product_id: "".into(), ..base.clone() },
            SalesOrderDraft { quantity: "0".into(), ..base.clone() },
            SalesOrderDraft { quantity: "-2".into(), ..base.clone() },
        ];
        for draft in cases {
            let err = draft.validate(&[product.clone()]).unwrap_err();
            assert_eq!(err.to_string(), INVALID_ORDER);
        }
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("Shipped".parse::<SalesStatus>().unwrap(), SalesStatus::Shipped);
        assert!("lost".parse::<SalesStatus>().is_err());
        assert_eq!(
            serde_json::to_value(SalesStatus::Delivered).unwrap(),
            serde_json::json!("delivered")
        );
    }

    #[test]
    fn test_placed_at_falls_back_to_created_at() {
        let created = "2026-03-01T10:00:00Z".parse().unwrap();
        let order = SalesOrder {
            order_number: 1001,
            customer_email: "a@b.co".into(),
            product_id: None,
            product_name: String::new(),
            quantity: 1,
            status: SalesStatus::New,
            order_date: None,
            created_at: Some(created),
        };
        assert_eq!(order.placed_at(), Some(created));
    }
}
