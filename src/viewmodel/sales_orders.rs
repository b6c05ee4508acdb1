use std::sync::Arc;

use super::{load_options, Collection, ViewResult};
use crate::backend::{Backend, Select};
use crate::models::{Entity, ProductOption, SalesOrder, SalesStatus, StatusFilter};

/// Sales orders screen: orders plus the product picker
pub struct SalesOrdersPage {
    orders: Collection<SalesOrder>,
    products: Vec<ProductOption>,
    status_filter: StatusFilter<SalesStatus>,
}

impl SalesOrdersPage {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            orders: Collection::new(backend),
            products: Vec::new(),
            status_filter: StatusFilter::All,
        }
    }

    pub fn orders(&self) -> &Collection<SalesOrder> {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut Collection<SalesOrder> {
        &mut self.orders
    }

    pub fn products(&self) -> &[ProductOption] {
        &self.products
    }

    /// Reload orders and product options together.
    ///
    /// Product options failing to load is not an error for the page.
    pub async fn refresh(&mut self) -> ViewResult<()> {
        let backend = Arc::clone(self.orders.backend());
        let query = Select::from(crate::models::Product::TABLE)
            .columns("id,name")
            .order(crate::backend::Order::asc("name"));

        let (orders, products) = tokio::join!(
            self.orders.refresh(),
            load_options::<ProductOption>(backend.as_ref(), &query)
        );
        if let Some(products) = products {
            self.products = products;
        }
        orders
    }

    /// Save the open form, copying the selected product's name
    pub async fn save(&mut self) -> ViewResult<()> {
        self.orders.save(&self.products).await
    }

    pub fn status_filter(&self) -> StatusFilter<SalesStatus> {
        self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter<SalesStatus>) {
        self.status_filter = filter;
    }

    /// Orders matching both the search term and the status filter
    pub fn filtered(&self) -> Vec<&SalesOrder> {
        self.orders
            .filtered()
            .into_iter()
            .filter(|order| self.status_filter.allows(&order.status))
            .collect()
    }
}
