//! Application composition
//!
//! Wires one backend client, one session manager and the navigator
//! together, and hands out page view-models bound to the same backend.

use std::sync::Arc;

use crate::backend::{Backend, BackendResult, RestBackend};
use crate::config::Config;
use crate::router::{Navigator, Resolution, Route, Tab};
use crate::session::SessionManager;
use crate::viewmodel::{
    DashboardPage, InventoryPage, PurchaseOrdersPage, SalesOrdersPage, SuppliersPage,
};

pub struct App {
    backend: Arc<dyn Backend>,
    session: SessionManager,
    navigator: Navigator,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            session: SessionManager::new(Arc::clone(&backend)),
            backend,
            navigator: Navigator::new(),
        }
    }

    /// Build against the hosted backend described by `config`
    pub fn from_config(config: &Config) -> BackendResult<Self> {
        if config.backend.anon_key.is_empty() {
            tracing::warn!("No anon key configured; requests will likely be rejected");
        }
        let backend = RestBackend::new(config.backend_config(), config.session_store())?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// Restore the session, start the listener and land on `/`
    pub async fn start(&mut self) -> Resolution {
        self.session.start().await;
        self.navigator.navigate("/", self.session.is_authenticated())
    }

    pub fn stop(&self) {
        self.session.stop();
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    /// Both halves of the app at once, for the login and sign-up pages
    pub fn parts(&mut self) -> (&SessionManager, &mut Navigator) {
        (&self.session, &mut self.navigator)
    }

    /// Navigate through the access gate
    pub fn open(&mut self, path: &str) -> Resolution {
        let authenticated = self.session.is_authenticated();
        self.navigator.navigate(path, authenticated)
    }

    /// Sidebar click; gated like any other navigation
    pub fn select_tab(&mut self, tab: Tab) -> Resolution {
        self.open(tab.route().path())
    }

    /// Sign out and return to the login screen
    pub async fn logout(&mut self) {
        self.session.sign_out().await;
        self.navigator.navigate(Route::Login.path(), false);
    }

    pub fn dashboard_page(&self) -> DashboardPage {
        DashboardPage::new(self.backend())
    }

    pub fn inventory_page(&self) -> InventoryPage {
        InventoryPage::new(self.backend())
    }

    pub fn sales_orders_page(&self) -> SalesOrdersPage {
        SalesOrdersPage::new(self.backend())
    }

    pub fn purchase_orders_page(&self) -> PurchaseOrdersPage {
        PurchaseOrdersPage::new(self.backend())
    }

    pub fn suppliers_page(&self) -> SuppliersPage {
        SuppliersPage::new(self.backend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::viewmodel::LoginPage;

    const EMAIL: &str = "ops@sunflow.test";

    #[tokio::test]
    async fn test_signed_out_start_lands_on_login() {
        let mut app = App::new(Arc::new(MemoryBackend::new()));
        assert_eq!(app.start().await, Resolution::Redirect(Route::Login));
        assert_eq!(app.open("/inventory"), Resolution::Redirect(Route::Login));
        assert_eq!(app.navigator().current(), Route::Login);
        app.stop();
    }

    #[tokio::test]
    async fn test_login_tabs_and_logout() {
        let mut app = App::new(Arc::new(
            MemoryBackend::new().with_account(EMAIL, "secret1"),
        ));
        app.start().await;

        let mut login = LoginPage::new();
        login.email = EMAIL.into();
        login.password = "secret1".into();
        let (session, navigator) = app.parts();
        assert!(login.submit(session, navigator).await);
        assert_eq!(app.navigator().active_tab(), Some(Tab::Dashboard));

        assert_eq!(app.select_tab(Tab::Suppliers), Resolution::Render(Route::Suppliers));
        assert_eq!(app.open("/login"), Resolution::Redirect(Route::Dashboard));

        app.logout().await;
        assert!(!app.session().is_authenticated());
        assert_eq!(app.navigator().current(), Route::Login);
        assert_eq!(app.open("/suppliers"), Resolution::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_pages_share_the_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let app = App::new(backend.clone());

        let mut inventory = app.inventory_page();
        inventory.refresh().await.unwrap();
        let mut suppliers = app.suppliers_page();
        suppliers.refresh().await.unwrap();

        assert_eq!(backend.calls().len(), 2);
    }
}
