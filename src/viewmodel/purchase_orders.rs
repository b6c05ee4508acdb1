use std::sync::Arc;

use super::{load_options, Collection, ViewResult};
use crate::backend::{Backend, Order, Select};
use crate::models::{
    Entity, Product, ProductOption, PurchaseLookup, PurchaseOrder, PurchaseStatus, StatusFilter,
    Supplier, SupplierOption,
};

/// Purchase orders screen: orders plus supplier and product pickers
pub struct PurchaseOrdersPage {
    orders: Collection<PurchaseOrder>,
    lookup: PurchaseLookup,
    /// Exact company name, or `None` for all suppliers
    supplier_filter: Option<String>,
    status_filter: StatusFilter<PurchaseStatus>,
}

impl PurchaseOrdersPage {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            orders: Collection::new(backend),
            lookup: PurchaseLookup::default(),
            supplier_filter: None,
            status_filter: StatusFilter::All,
        }
    }

    pub fn orders(&self) -> &Collection<PurchaseOrder> {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut Collection<PurchaseOrder> {
        &mut self.orders
    }

    pub fn suppliers(&self) -> &[SupplierOption] {
        &self.lookup.suppliers
    }

    pub fn products(&self) -> &[ProductOption] {
        &self.lookup.products
    }

    /// Reload orders and both option lists in parallel
    pub async fn refresh(&mut self) -> ViewResult<()> {
        let backend = Arc::clone(self.orders.backend());
        let supplier_query = Select::from(Supplier::TABLE)
            .columns("id,company_name")
            .order(Order::asc("company_name"));
        let product_query = Select::from(Product::TABLE)
            .columns("id,name,price")
            .order(Order::asc("name"));

        let (orders, suppliers, products) = tokio::join!(
            self.orders.refresh(),
            load_options::<SupplierOption>(backend.as_ref(), &supplier_query),
            load_options::<ProductOption>(backend.as_ref(), &product_query)
        );
        if let Some(suppliers) = suppliers {
            self.lookup.suppliers = suppliers;
        }
        if let Some(products) = products {
            self.lookup.products = products;
        }
        orders
    }

    /// Save the open form with supplier/product names and list price filled in
    pub async fn save(&mut self) -> ViewResult<()> {
        self.orders.save(&self.lookup).await
    }

    pub fn supplier_filter(&self) -> Option<&str> {
        self.supplier_filter.as_deref()
    }

    pub fn set_supplier_filter(&mut self, company_name: Option<String>) {
        self.supplier_filter = company_name.filter(|name| !name.eq_ignore_ascii_case("all"));
    }

    pub fn status_filter(&self) -> StatusFilter<PurchaseStatus> {
        self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter<PurchaseStatus>) {
        self.status_filter = filter;
    }

    /// Orders matching the search term, supplier filter and status filter
    pub fn filtered(&self) -> Vec<&PurchaseOrder> {
        self.orders
            .filtered()
            .into_iter()
            .filter(|order| match &self.supplier_filter {
                Some(name) => &order.supplier_name == name,
                None => true,
            })
            .filter(|order| self.status_filter.allows(&order.status))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Filter, MemoryBackend, Operation};
    use serde_json::json;
    use uuid::Uuid;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        acme: Uuid,
        inverter: Uuid,
    }

    fn seeded() -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let acme = Uuid::new_v4();
        let inverter = Uuid::new_v4();
        backend.seed(
            "suppliers",
            vec![
                json!({ "id": acme, "company_name": "Acme Power", "contact_person": "Jane", "contact_email": "jane@acme.test" }),
                json!({ "id": Uuid::new_v4(), "company_name": "BrightSky Electronics", "contact_person": "Lee", "contact_email": "lee@brightsky.test" }),
            ],
        );
        backend.seed(
            "products",
            vec![json!({ "id": inverter, "name": "Inverter 5kW", "price": 450.0, "quantity": 4 })],
        );
        Fixture {
            backend,
            acme,
            inverter,
        }
    }

    #[tokio::test]
    async fn test_create_carries_names_that_survive_rename() {
        let Fixture {
            backend,
            acme,
            inverter,
        } = seeded();
        let mut page = PurchaseOrdersPage::new(backend.clone());
        page.refresh().await.unwrap();
        assert_eq!(page.suppliers().len(), 2);
        assert_eq!(page.products()[0].price, Some(450.0));

        page.orders_mut().open_create();
        {
            let form = page.orders_mut().form_mut().unwrap();
            form.supplier_id = acme.to_string();
            form.product_id = inverter.to_string();
            form.product_quantity = "3".into();
        }
        page.save().await.unwrap();

        let order = page.orders().rows()[0].clone();
        assert_eq!(order.supplier_name, "Acme Power");
        assert_eq!(order.product_name, "Inverter 5kW");
        assert_eq!(order.product_quantity, 3);
        assert_eq!(order.product_price, 450.0);
        assert_eq!(order.status, PurchaseStatus::Sent);

        backend
            .update(
                "products",
                &Filter::eq("id", inverter),
                json!({ "name": "Inverter 6kW" }),
            )
            .await
            .unwrap();
        page.refresh().await.unwrap();

        assert_eq!(page.products()[0].name, "Inverter 6kW");
        assert_eq!(page.orders().rows()[0].product_name, "Inverter 5kW");
    }

    #[tokio::test]
    async fn test_missing_supplier_rejected() {
        let Fixture {
            backend, inverter, ..
        } = seeded();
        let mut page = PurchaseOrdersPage::new(backend.clone());
        page.refresh().await.unwrap();
        backend.clear_calls();

        page.orders_mut().open_create();
        page.orders_mut().form_mut().unwrap().product_id = inverter.to_string();
        assert!(page.save().await.is_err());

        assert_eq!(
            page.orders().error(),
            Some("Please select supplier/product and quantity > 0")
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_filters() {
        let Fixture { backend, .. } = seeded();
        backend.seed(
            "purchase_orders",
            vec![
                json!({ "id": Uuid::new_v4(), "supplier_name": "Acme Power", "product_name": "Inverter 5kW", "product_quantity": 2, "product_price": 450.0, "status": "sent" }),
                json!({ "id": Uuid::new_v4(), "supplier_name": "Acme Power", "product_name": "Inverter 5kW", "product_quantity": 1, "product_price": 450.0, "status": "received" }),
                json!({ "id": Uuid::new_v4(), "supplier_name": "BrightSky Electronics", "product_name": "Battery", "product_quantity": 9, "product_price": 80.0, "status": "sent" }),
            ],
        );
        let mut page = PurchaseOrdersPage::new(backend.clone());
        page.refresh().await.unwrap();
        assert_eq!(page.filtered().len(), 3);

        page.set_supplier_filter(Some("Acme Power".into()));
        assert_eq!(page.filtered().len(), 2);

        page.set_status_filter(StatusFilter::Only(PurchaseStatus::Received));
        assert_eq!(page.filtered().len(), 1);

        page.set_supplier_filter(Some("All".into()));
        page.set_status_filter(StatusFilter::Only(PurchaseStatus::Sent));
        page.orders_mut().set_search("bright");
        assert_eq!(page.filtered().len(), 1);
        assert_eq!(page.supplier_filter(), None);
    }

    #[tokio::test]
    async fn test_delete_prompt() {
        let Fixture { backend, .. } = seeded();
        let id = Uuid::new_v4();
        backend.seed(
            "purchase_orders",
            vec![json!({ "id": id, "supplier_name": "Acme Power", "product_quantity": 2, "product_price": 1.0, "status": "sent" })],
        );
        let mut page = PurchaseOrdersPage::new(backend.clone());
        page.refresh().await.unwrap();

        let prompt = std::sync::Mutex::new(String::new());
        let answer = |p: &str| {
            *prompt.lock().unwrap() = p.to_string();
            true
        };
        assert!(page.orders_mut().remove(&id, &answer).await.unwrap());
        assert_eq!(*prompt.lock().unwrap(), "Delete this PO?");
        assert_eq!(backend.count(Operation::Delete, Some("purchase_orders")), 1);
        assert!(page.orders().rows().is_empty());
    }
}
