use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable, Product};

pub const INVENTORY_SUMMARY_VIEW: &str = "inventory_summary";
pub const SALES_SUMMARY_VIEW: &str = "sales_summary";
pub const PURCHASE_SUMMARY_VIEW: &str = "purchase_summary";

/// Products created within this window count as recently added
const RECENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Sum of on-hand unit quantities across all products
    #[serde(default, deserialize_with = "nullable")]
    pub total_items: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub low_stock: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub out_of_stock: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub recently_added: i64,
}

impl InventorySummary {
    /// Compute the summary locally with the same rules as the backend view
    pub fn from_products(products: &[Product], now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(RECENT_DAYS);
        let mut summary = Self::default();
        for product in products {
            summary.total_items += product.quantity;
            if product.quantity == 0 {
                summary.out_of_stock += 1;
            } else if product.quantity <= super::product::LOW_STOCK_MAX {
                summary.low_stock += 1;
            }
            if product.created_at.is_some_and(|at| at >= cutoff) {
                summary.recently_added += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    #[serde(default, deserialize_with = "nullable")]
    pub total_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub pending_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub completed_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSummary {
    #[serde(default, deserialize_with = "nullable")]
    pub total_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub pending_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub completed_orders: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub spent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn product(quantity: i64, created_at: Option<DateTime<Utc>>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "p".into(),
            price: 1.0,
            quantity,
            units_sold: 0,
            image_url: None,
            created_at,
        }
    }

    #[test]
    fn test_from_products_sums_quantities() {
        let now: DateTime<Utc> = "2026-10-17T12:00:00Z".parse().unwrap();
        let products = vec![
            product(0, Some(now - Duration::days(30))),
            product(3, Some(now - Duration::days(1))),
            product(5, None),
            product(40, Some(now)),
        ];
        let summary = InventorySummary::from_products(&products, now);
        assert_eq!(summary.total_items, 48);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.low_stock, 2);
        assert_eq!(summary.recently_added, 2);
    }

    #[test]
    fn test_view_row_with_nulls() {
        let summary: SalesSummary = serde_json::from_value(serde_json::json!({
            "total_orders": 87,
            "pending_orders": 14,
            "completed_orders": 73,
            "revenue": null
        }))
        .unwrap();
        assert_eq!(summary.total_orders, 87);
        assert_eq!(summary.revenue, 0.0);
    }
}
