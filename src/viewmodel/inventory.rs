use chrono::{DateTime, Utc};

use super::Collection;
use crate::models::{InventorySummary, Product, StockLevel};

/// Inventory screen: the product list with stock badges
pub type InventoryPage = Collection<Product>;

impl Collection<Product> {
    /// Products at or below the low-stock threshold
    pub fn low_stock(&self) -> Vec<&Product> {
        self.rows()
            .iter()
            .filter(|p| p.stock_level() == StockLevel::Low)
            .collect()
    }

    /// Summary computed from the loaded rows
    pub fn summary(&self, now: DateTime<Utc>) -> InventorySummary {
        InventorySummary::from_products(self.rows(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_low_stock_and_summary() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            "products",
            vec![
                json!({ "id": Uuid::new_v4(), "name": "Battery 12V", "price": 89.5, "quantity": 2 }),
                json!({ "id": Uuid::new_v4(), "name": "Panel", "price": 199.0, "quantity": 20 }),
                json!({ "id": Uuid::new_v4(), "name": "Cable", "price": 4.0, "quantity": 0 }),
            ],
        );
        let mut page = InventoryPage::new(backend);
        page.refresh().await.unwrap();

        let low: Vec<&str> = page.low_stock().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(low.len(), 2);
        assert!(low.contains(&"Battery 12V"));
        assert!(low.contains(&"Cable"));

        let summary = page.summary(Utc::now());
        assert_eq!(summary.total_items, 22);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.low_stock, 1);
    }
}
