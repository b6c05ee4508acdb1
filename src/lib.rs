//! # SunFlow Inventory
//!
//! Client for a small inventory admin: products, sales orders, purchase
//! orders and suppliers kept in a hosted identity + relational-data service,
//! plus a dashboard of aggregate views.
//!
//! ## Modules
//!
//! - [`backend`]: The service boundary (`Backend` trait, REST client, in-memory fake)
//! - [`session`]: Session manager and first-sign-in profile bootstrap
//! - [`router`]: Paths, access gate and sidebar tabs
//! - [`models`]: Rows and form drafts
//! - [`viewmodel`]: Per-page state and operations
//! - [`format`] / [`render`]: Display helpers for the terminal front end
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sunflow::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let mut app = App::from_config(&config)?;
//!     app.start().await;
//!
//!     app.session().sign_in("ops@example.com", "secret").await?;
//!
//!     let mut inventory = app.inventory_page();
//!     inventory.refresh().await?;
//!     for product in inventory.rows() {
//!         println!("{} x{}", product.name, product.quantity);
//!     }
//!
//!     app.stop();
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod backend;
pub mod config;
pub mod format;
pub mod models;
pub mod render;
pub mod router;
pub mod session;
pub mod viewmodel;

// Re-export top-level types for convenience
pub use app::App;

pub use backend::{
    Backend, BackendConfig, BackendError, BackendResult, MemoryBackend, RestBackend, SessionStore,
};

pub use config::{Config, ConfigError};

pub use models::{
    ActivityEvent, Draft, Entity, Product, Profile, PurchaseOrder, PurchaseStatus, SalesOrder,
    SalesStatus, StatusFilter, Supplier,
};

pub use router::{resolve, Navigator, Resolution, Route, Tab};

pub use session::{SessionManager, Session, SignUpForm, SignUpOutcome, User};

pub use viewmodel::{
    Collection, Confirm, DashboardPage, InventoryPage, LoadState, LoginPage, PurchaseOrdersPage,
    SalesOrdersPage, SignUpPage, SuppliersPage, ValidationError, ViewError, ViewResult,
};
