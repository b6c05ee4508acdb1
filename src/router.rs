//! Page Router / Access Gate
//!
//! Maps paths to screens and enforces who may see them: protected screens
//! need a session, the login and sign-up screens need its absence.

use std::fmt;

/// Every addressable screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Inventory,
    SalesOrders,
    PurchaseOrders,
    Suppliers,
}

/// Who may render a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only without a session; signed-in users go to the dashboard
    Anonymous,
    /// Only with a session; everyone else goes to login
    Protected,
}

/// Outcome of resolving a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
    NotFound,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Signup,
        Route::Dashboard,
        Route::Inventory,
        Route::SalesOrders,
        Route::PurchaseOrders,
        Route::Suppliers,
    ];

    /// Exact match on the path; a trailing slash and query string are ignored.
    /// `/` is not a route of its own, see [`resolve`].
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        Route::ALL.into_iter().find(|r| r.path() == trimmed)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::Inventory => "/inventory",
            Route::SalesOrders => "/sales-orders",
            Route::PurchaseOrders => "/purchase-orders",
            Route::Suppliers => "/suppliers",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Signup => Access::Anonymous,
            _ => Access::Protected,
        }
    }

    /// Sidebar tab shown as active on this route
    pub fn tab(&self) -> Option<Tab> {
        match self {
            Route::Dashboard => Some(Tab::Dashboard),
            Route::Inventory => Some(Tab::Inventory),
            Route::SalesOrders => Some(Tab::SalesOrders),
            Route::PurchaseOrders => Some(Tab::PurchaseOrders),
            Route::Suppliers => Some(Tab::Suppliers),
            Route::Login | Route::Signup => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Resolve a path against the session state.
///
/// `/` sends everyone to the dashboard, which in turn sends anonymous
/// visitors to login; the redirect chain is collapsed here.
pub fn resolve(path: &str, authenticated: bool) -> Resolution {
    let bare = path.split(['?', '#']).next().unwrap_or("");
    if bare.trim_end_matches('/').is_empty() {
        return gate(Route::Dashboard, authenticated)
            .map_or(Resolution::Redirect(Route::Dashboard), Resolution::Redirect);
    }

    match Route::from_path(path) {
        Some(route) => match gate(route, authenticated) {
            Some(target) => Resolution::Redirect(target),
            None => Resolution::Render(route),
        },
        None => Resolution::NotFound,
    }
}

/// Where to send the visitor instead, if they may not see `route`
fn gate(route: Route, authenticated: bool) -> Option<Route> {
    match (route.access(), authenticated) {
        (Access::Protected, false) => Some(Route::Login),
        (Access::Anonymous, true) => Some(Route::Dashboard),
        _ => None,
    }
}

/// Sidebar entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Dashboard,
    Inventory,
    SalesOrders,
    PurchaseOrders,
    Suppliers,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Dashboard,
        Tab::Inventory,
        Tab::SalesOrders,
        Tab::PurchaseOrders,
        Tab::Suppliers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Inventory => "Inventory",
            Tab::SalesOrders => "Sales orders",
            Tab::PurchaseOrders => "Purchase orders",
            Tab::Suppliers => "Suppliers",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tab::Dashboard => "🏠",
            Tab::Inventory => "📦",
            Tab::SalesOrders => "🛒",
            Tab::PurchaseOrders => "📋",
            Tab::Suppliers => "🚛",
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Tab::Dashboard => Route::Dashboard,
            Tab::Inventory => Route::Inventory,
            Tab::SalesOrders => Route::SalesOrders,
            Tab::PurchaseOrders => Route::PurchaseOrders,
            Tab::Suppliers => Route::Suppliers,
        }
    }
}

/// Current location, kept in sync with the active sidebar tab
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: Route::Login,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Go to `path`, following any redirect. An unknown path leaves the
    /// current location unchanged.
    pub fn navigate(&mut self, path: &str, authenticated: bool) -> Resolution {
        let resolution = resolve(path, authenticated);
        match resolution {
            Resolution::Render(route) | Resolution::Redirect(route) => {
                tracing::debug!(from = %self.current, to = %route, "Navigate");
                self.current = route;
            }
            Resolution::NotFound => {
                tracing::debug!(path = path, "No route");
            }
        }
        resolution
    }

    /// Clicking a sidebar tab moves to its route
    pub fn select_tab(&mut self, tab: Tab) -> Route {
        self.current = tab.route();
        self.current
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.current.tab()
    }

    /// Re-check the current route after the session changed
    pub fn revalidate(&mut self, authenticated: bool) -> Resolution {
        self.navigate(self.current.path(), authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/inventory"), Some(Route::Inventory));
        assert_eq!(Route::from_path("/sales-orders/"), Some(Route::SalesOrders));
        assert_eq!(Route::from_path("/suppliers?q=acme"), Some(Route::Suppliers));
        assert_eq!(Route::from_path("/"), None);
        assert_eq!(Route::from_path("/nope"), None);

        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_protected_routes_need_session() {
        for route in Route::ALL.into_iter().filter(|r| r.access() == Access::Protected) {
            assert_eq!(resolve(route.path(), false), Resolution::Redirect(Route::Login));
            assert_eq!(resolve(route.path(), true), Resolution::Render(route));
        }
    }

    #[test]
    fn test_anonymous_routes_bounce_signed_in_users() {
        assert_eq!(resolve("/login", true), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve("/signup", true), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve("/login", false), Resolution::Render(Route::Login));
    }

    #[test]
    fn test_root_and_unknown() {
        assert_eq!(resolve("/", true), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve("/", false), Resolution::Redirect(Route::Login));
        assert_eq!(resolve("", true), Resolution::Redirect(Route::Dashboard));
        assert_eq!(resolve("/reports", true), Resolution::NotFound);
    }

    #[test]
    fn test_tabs_and_routes_stay_in_sync() {
        let mut nav = Navigator::new();
        assert_eq!(nav.active_tab(), None);

        nav.navigate("/purchase-orders", true);
        assert_eq!(nav.active_tab(), Some(Tab::PurchaseOrders));

        assert_eq!(nav.select_tab(Tab::Suppliers), Route::Suppliers);
        assert_eq!(nav.current().path(), "/suppliers");

        for tab in Tab::ALL {
            assert_eq!(tab.route().tab(), Some(tab));
        }
        assert_eq!(Tab::SalesOrders.label(), "Sales orders");
    }

    #[test]
    fn test_navigator_follows_redirects() {
        let mut nav = Navigator::new();
        assert_eq!(nav.navigate("/inventory", false), Resolution::Redirect(Route::Login));
        assert_eq!(nav.current(), Route::Login);

        assert_eq!(nav.navigate("/nowhere", false), Resolution::NotFound);
        assert_eq!(nav.current(), Route::Login);

        nav.navigate("/inventory", true);
        assert_eq!(nav.revalidate(false), Resolution::Redirect(Route::Login));
        assert_eq!(nav.current(), Route::Login);
    }
}
