use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{contains_ci, nullable, parse_count, parse_number, Draft, Entity};
use crate::backend::Select;
use crate::viewmodel::ValidationError;

/// At or below this quantity a product is flagged as low stock
pub const LOW_STOCK_MAX: i64 = 5;
/// At or above this quantity a product is flagged as well stocked
pub const HIGH_STOCK_MIN: i64 = 15;

const INVALID_PRODUCT: &str = "Please provide valid name, non-negative price and quantity.";

/// An inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub units_sold: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::for_quantity(self.quantity)
    }
}

impl Entity for Product {
    type Key = Uuid;
    type Draft = ProductDraft;

    const TABLE: &'static str = "products";
    const KEY_COLUMN: &'static str = "id";
    const NOUN: &'static str = "product";

    fn select() -> Select {
        Select::from(Self::TABLE)
            .columns("id,name,price,quantity,units_sold,image_url,created_at")
            .order(crate::backend::Order::desc("created_at"))
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
    }

    fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            id: Some(self.id),
            name: self.name.clone(),
            price: self.price.to_string(),
            quantity: self.quantity.to_string(),
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Stock badge shown next to each product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Low,
    Normal,
    High,
}

impl StockLevel {
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity <= LOW_STOCK_MAX {
            StockLevel::Low
        } else if quantity >= HIGH_STOCK_MIN {
            StockLevel::High
        } else {
            StockLevel::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockLevel::Low => "Low Stock",
            StockLevel::Normal => "In Stock",
            StockLevel::High => "Well Stocked",
        }
    }
}

/// Create/edit form for a product. Numeric fields hold raw input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPayload {
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

impl Draft for ProductDraft {
    type Key = Uuid;
    type Lookup = ();
    type Payload = ProductPayload;

    fn key(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self, _: &()) -> Result<ProductPayload, ValidationError> {
        let name = self.name.trim();
        let price = parse_number(&self.price).filter(|p| *p >= 0.0);
        let quantity = parse_count(&self.quantity).filter(|q| *q >= 0);

        match (name.is_empty(), price, quantity) {
            (false, Some(price), Some(quantity)) => {
                let image_url = self.image_url.trim();
                Ok(ProductPayload {
                    name: name.to_string(),
                    price,
                    quantity,
                    image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
                })
            }
            _ => Err(ValidationError::new(INVALID_PRODUCT)),
        }
    }
}

/// `id,name[,price]` projection used to populate product pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}
