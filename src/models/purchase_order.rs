use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{
    contains_ci, nullable, parse_count, parse_number, Draft, Entity, ProductOption,
    SupplierOption,
};
use crate::backend::{Order, Select};
use crate::viewmodel::ValidationError;

const INVALID_PO: &str = "Please select supplier/product and quantity > 0";
const NEGATIVE_PRICE: &str = "Price cannot be negative";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Sent,
    Received,
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 2] = [PurchaseStatus::Sent, PurchaseStatus::Received];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Sent => "sent",
            PurchaseStatus::Received => "received",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PurchaseStatus::Sent => "Sent",
            PurchaseStatus::Received => "Received",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PurchaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::new(format!("Unknown purchase order status: {}", s)))
    }
}

/// An order placed with a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    /// Copied from the supplier when the order was written
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_name: String,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default, deserialize_with = "nullable")]
    pub product_name: String,
    pub product_quantity: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub product_price: f64,
    #[serde(default)]
    pub status: PurchaseStatus,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PurchaseOrder {
    pub fn total(&self) -> f64 {
        self.product_price * self.product_quantity as f64
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.order_date.or(self.created_at)
    }
}

impl Entity for PurchaseOrder {
    type Key = Uuid;
    type Draft = PurchaseOrderDraft;

    const TABLE: &'static str = "purchase_orders";
    const KEY_COLUMN: &'static str = "id";
    const NOUN: &'static str = "PO";

    fn select() -> Select {
        Select::from(Self::TABLE).order(Order::desc("created_at"))
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.supplier_name, needle)
    }

    fn to_draft(&self) -> PurchaseOrderDraft {
        PurchaseOrderDraft {
            id: Some(self.id),
            supplier_id: self.supplier_id.map(|id| id.to_string()).unwrap_or_default(),
            supplier_name: self.supplier_name.clone(),
            product_id: self.product_id.map(|id| id.to_string()).unwrap_or_default(),
            product_name: self.product_name.clone(),
            product_quantity: self.product_quantity.to_string(),
            product_price: self.product_price.to_string(),
            status: self.status,
        }
    }
}

/// Supplier and product pickers for the purchase order form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseLookup {
    pub suppliers: Vec<SupplierOption>,
    pub products: Vec<ProductOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOrderDraft {
    pub id: Option<Uuid>,
    pub supplier_id: String,
    pub supplier_name: String,
    pub product_id: String,
    pub product_name: String,
    pub product_quantity: String,
    /// "0" or blank means use the product's list price
    pub product_price: String,
    pub status: PurchaseStatus,
}

impl Default for PurchaseOrderDraft {
    fn default() -> Self {
        Self {
            id: None,
            supplier_id: String::new(),
            supplier_name: String::new(),
            product_id: String::new(),
            product_name: String::new(),
            product_quantity: "1".to_string(),
            product_price: "0".to_string(),
            status: PurchaseStatus::Sent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderPayload {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_quantity: i64,
    pub product_price: f64,
    pub status: PurchaseStatus,
}

impl Draft for PurchaseOrderDraft {
    type Key = Uuid;
    type Lookup = PurchaseLookup;
    type Payload = PurchaseOrderPayload;

    fn key(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self, lookup: &PurchaseLookup) -> Result<PurchaseOrderPayload, ValidationError> {
        let supplier_id = Uuid::parse_str(self.supplier_id.trim()).ok();
        let product_id = Uuid::parse_str(self.product_id.trim()).ok();
        let quantity = parse_count(&self.product_quantity).filter(|q| *q > 0);

        let (Some(supplier_id), Some(product_id), Some(product_quantity)) =
            (supplier_id, product_id, quantity)
        else {
            return Err(ValidationError::new(INVALID_PO));
        };

        let supplier = lookup.suppliers.iter().find(|s| s.id == supplier_id);
        let product = lookup.products.iter().find(|p| p.id == product_id);

        let entered = if self.product_price.trim().is_empty() {
            None
        } else {
            match parse_number(&self.product_price) {
                Some(price) if price < 0.0 => return Err(ValidationError::new(NEGATIVE_PRICE)),
                Some(price) => Some(price),
                None => return Err(ValidationError::new(INVALID_PO)),
            }
        };
        let product_price = match entered {
            Some(price) if price > 0.0 => price,
            _ => product.and_then(|p| p.price).unwrap_or(0.0),
        };

        Ok(PurchaseOrderPayload {
            supplier_id,
            supplier_name: supplier
                .map(|s| s.company_name.clone())
                .unwrap_or_else(|| self.supplier_name.clone()),
            product_id,
            product_name: product
                .map(|p| p.name.clone())
                .unwrap_or_else(|| self.product_name.clone()),
            product_quantity,
            product_price,
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> PurchaseLookup {
        PurchaseLookup {
            suppliers: vec![SupplierOption {
                id: Uuid::new_v4(),
                company_name: "Acme".into(),
            }],
            products: vec![ProductOption {
                id: Uuid::new_v4(),
                name: "Widget".into(),
                price: Some(4.25),
            }],
        }
    }

    fn draft_for(lookup: &PurchaseLookup) -> PurchaseOrderDraft {
        PurchaseOrderDraft {
            supplier_id: lookup.suppliers[0].id.to_string(),
            product_id: lookup.products[0].id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let draft = PurchaseOrderDraft::default();
        assert_eq!(draft.product_quantity, "1");
        assert_eq!(draft.product_price, "0");
        assert_eq!(draft.status, PurchaseStatus::Sent);
    }

    #[test]
    fn test_denormalises_names_and_list_price() {
        let lookup = lookup();
        let payload = draft_for(&lookup).validate(&lookup).unwrap();
        assert_eq!(payload.supplier_name, "Acme");
        assert_eq!(payload.product_name, "Widget");
        assert_eq!(payload.product_price, 4.25);
        assert_eq!(payload.product_quantity, 1);
    }

    #[test]
    fn test_entered_price_wins() {
        let lookup = lookup();
        let draft = PurchaseOrderDraft {
            product_price: "3.10".into(),
            ..draft_for(&lookup)
        };
        assert_eq!(draft.validate(&lookup).unwrap().product_price, 3.10);

        let blank = PurchaseOrderDraft {
            product_price: " ".into(),
            ..draft_for(&lookup)
        };
        assert_eq!(blank.validate(&lookup).unwrap().product_price, 4.25);
    }

    #[test]
    fn test_missing_selection_or_quantity() {
        let lookup = lookup();
        let cases = [
            PurchaseOrderDraft { supplier_id: "".into(), ..draft_for(&lookup) },
            PurchaseOrderDraft { product_id: "".into(), ..draft_for(&lookup) },
            PurchaseOrderDraft { product_quantity: "0".into(), ..draft_for(&lookup) },
        ];
        for draft in cases {
            assert_eq!(draft.validate(&lookup).unwrap_err().to_string(), INVALID_PO);
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        let lookup = lookup();
        let draft = PurchaseOrderDraft {
            product_price: "-1".into(),
            ..draft_for(&lookup)
        };
        assert_eq!(draft.validate(&lookup).unwrap_err().to_string(), NEGATIVE_PRICE);
    }

    #[test]
    fn test_edit_keeps_names_of_unlisted_rows() {
        let order = PurchaseOrder {
            id: Uuid::new_v4(),
            supplier_id: Some(Uuid::new_v4()),
            supplier_name: "Gone Ltd".into(),
            product_id: Some(Uuid::new_v4()),
            product_name: "Old Part".into(),
            product_quantity: 4,
            product_price: 2.0,
            status: PurchaseStatus::Received,
            order_date: None,
            created_at: None,
        };
        let payload = order.to_draft().validate(&PurchaseLookup::default()).unwrap();
        assert_eq!(payload.supplier_name, "Gone Ltd");
        assert_eq!(payload.product_name, "Old Part");
        assert_eq!(payload.product_price, 2.0);
        assert_eq!(payload.status, PurchaseStatus::Received);
        assert_eq!(order.total(), 8.0);
    }
}
