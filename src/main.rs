//! SunFlow CLI
//!
//! Terminal front end for the inventory admin:
//! - Sign in, sign up, sign out
//! - Dashboard summaries and recent activity
//! - List/add/edit/delete products, sales orders, purchase orders, suppliers

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use sunflow::config::{generate_default_config, LoggingConfig};
use sunflow::models::{ProductOption, SupplierOption};
use sunflow::{
    render, App, Collection, Config, Entity, LoginPage, PurchaseStatus, Resolution, Route,
    SalesStatus, SignUpForm, SignUpOutcome, SignUpPage, StatusFilter,
};

#[derive(Parser)]
#[command(name = "sunflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SunFlow inventory administration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// Password (prompted for twice when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or change the profile display name
    Profile {
        #[arg(long)]
        username: Option<String>,
    },

    /// Resolve a path through the access gate (e.g. /inventory)
    Open { path: String },

    /// Summary cards and recent activity
    Dashboard,

    /// Inventory
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Sales orders
    Sales {
        #[command(subcommand)]
        action: SalesAction,
    },

    /// Purchase orders
    Purchases {
        #[command(subcommand)]
        action: PurchaseAction,
    },

    /// Suppliers
    Suppliers {
        #[command(subcommand)]
        action: SupplierAction,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProductAction {
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        quantity: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SalesAction {
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// all, new, confirmed, shipped, delivered
        #[arg(long, default_value = "all")]
        status: String,
    },
    Add {
        #[arg(long)]
        email: String,
        /// Product id or exact name
        #[arg(long)]
        product: String,
        #[arg(long, default_value = "1")]
        quantity: String,
        #[arg(long, default_value = "new")]
        status: String,
    },
    Edit {
        order_number: i64,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Delete {
        order_number: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PurchaseAction {
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// Exact company name
        #[arg(long)]
        supplier: Option<String>,
        /// all, sent, received
        #[arg(long, default_value = "all")]
        status: String,
    },
    Add {
        /// Supplier id or exact company name
        #[arg(long)]
        supplier: String,
        /// Product id or exact name
        #[arg(long)]
        product: String,
        #[arg(long, default_value = "1")]
        quantity: String,
        /// Unit price; 0 uses the product's list price
        #[arg(long, default_value = "0")]
        price: String,
        #[arg(long, default_value = "sent")]
        status: String,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Delete {
        id: Uuid,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SupplierAction {
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        company: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        email: String,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        id: Uuid,
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut app = App::from_config(&config)?;
    app.start().await;
    let json = cli.format == "json";

    let result = run(&mut app, cli.command, json).await;
    app.stop();
    result
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sunflow={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(app: &mut App, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let mut page = LoginPage::new();
            page.email = email;
            page.password = password;

            let (session, navigator) = app.parts();
            if !page.submit(session, navigator).await {
                bail!("{}", page.error().unwrap_or("Sign in failed"));
            }
            println!("Signed in as {}", app.session().display_name());
        }

        Commands::Signup {
            email,
            first_name,
            last_name,
            password,
        } => {
            let (password, confirm_password) = match password {
                Some(p) => (p.clone(), p),
                None => (prompt("Password")?, prompt("Confirm password")?),
            };
            let mut page = SignUpPage::new();
            page.form = SignUpForm {
                email,
                password,
                confirm_password,
                first_name,
                last_name,
            };

            let (session, navigator) = app.parts();
            match page.submit(session, navigator).await {
                Some(SignUpOutcome::SignedIn(session)) => {
                    println!("Account created; signed in as {}", session.user.email.unwrap_or_default());
                }
                Some(SignUpOutcome::ConfirmationRequired { email }) => {
                    println!("Check {} for a confirmation link, then run `sunflow login`.", email);
                }
                None => bail!("{}", page.error().unwrap_or("Sign up failed")),
            }
        }

        Commands::Logout => {
            app.logout().await;
            println!("Signed out");
        }

        Commands::Whoami => {
            require(app, Route::Dashboard)?;
            wait_for_profile(app).await;
            let user = app.session().user();
            let email = user.as_ref().and_then(|u| u.email.clone());
            if json {
                print_json(&json!({
                    "id": user.as_ref().map(|u| u.id),
                    "email": email,
                    "display_name": app.session().display_name(),
                    "profile": app.session().profile(),
                }))?;
            } else {
                println!("{}", render::sidebar(app.navigator(), &app.session().display_name(), email.as_deref()));
            }
        }

        Commands::Profile { username } => {
            require(app, Route::Dashboard)?;
            wait_for_profile(app).await;
            if let Some(username) = username {
                app.session()
                    .update_username(&username)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            }
            match app.session().profile() {
                Some(profile) if json => print_json(&profile)?,
                Some(profile) => println!(
                    "{}  {}",
                    profile.id,
                    profile.username.unwrap_or_else(|| "(no username)".to_string())
                ),
                None => println!("No profile"),
            }
        }

        Commands::Open { path } => {
            let resolution = app.open(&path);
            match resolution {
                Resolution::Render(route) => println!("{}", route),
                Resolution::Redirect(route) => println!("{} -> {}", path, route),
                Resolution::NotFound => bail!("No page at {}", path),
            }
            if app.session().is_authenticated() {
                let user = app.session().user();
                let email = user.as_ref().and_then(|u| u.email.as_deref());
                println!();
                println!("{}", render::sidebar(app.navigator(), &app.session().display_name(), email));
            }
        }

        Commands::Dashboard => {
            require(app, Route::Dashboard)?;
            let mut page = app.dashboard_page();
            page.refresh().await;
            if json {
                print_json(&json!({
                    "inventory": section_json(page.inventory()),
                    "sales": section_json(page.sales()),
                    "purchases": section_json(page.purchases()),
                    "activity": section_json(page.activity()),
                    "error": page.error(),
                }))?;
            } else {
                println!("{}", render::dashboard(&page, Utc::now()));
            }
        }

        Commands::Products { action } => products(app, action, json).await?,
        Commands::Sales { action } => sales(app, action, json).await?,
        Commands::Purchases { action } => purchases(app, action, json).await?,
        Commands::Suppliers { action } => suppliers(app, action, json).await?,

        Commands::Config { .. } => {}
    }
    Ok(())
}

async fn products(app: &mut App, action: ProductAction, json: bool) -> anyhow::Result<()> {
    require(app, Route::Inventory)?;
    let mut page = app.inventory_page();
    load(page.refresh().await, page.error())?;

    match action {
        ProductAction::List { search } => {
            page.set_search(search.unwrap_or_default());
            let rows = page.filtered();
            if json {
                print_json(&rows)?;
            } else {
                println!("{}", render::products(&rows));
            }
        }
        ProductAction::Add {
            name,
            price,
            quantity,
            image_url,
        } => {
            page.open_create();
            if let Some(form) = page.form_mut() {
                form.name = name;
                form.price = price;
                form.quantity = quantity;
                form.image_url = image_url.unwrap_or_default();
            }
            finish(page.save(&()).await, &page, "Product added")?;
        }
        ProductAction::Edit {
            id,
            name,
            price,
            quantity,
            image_url,
        } => {
            open_for_edit(&mut page, &id)?;
            if let Some(form) = page.form_mut() {
                set(&mut form.name, name);
                set(&mut form.price, price);
                set(&mut form.quantity, quantity);
                set(&mut form.image_url, image_url);
            }
            finish(page.save(&()).await, &page, "Product updated")?;
        }
        ProductAction::Delete { id, yes } => delete(&mut page, &id, yes).await?,
    }
    Ok(())
}

async fn sales(app: &mut App, action: SalesAction, json: bool) -> anyhow::Result<()> {
    require(app, Route::SalesOrders)?;
    let mut page = app.sales_orders_page();
    load(page.refresh().await, page.orders().error())?;

    match action {
        SalesAction::List { search, status } => {
            page.set_status_filter(status.parse()?);
            page.orders_mut().set_search(search.unwrap_or_default());
            let rows = page.filtered();
            if json {
                print_json(&rows)?;
            } else {
                println!("{}", render::sales_orders(&rows));
            }
        }
        SalesAction::Add {
            email,
            product,
            quantity,
            status,
        } => {
            let status: SalesStatus = status.parse()?;
            let product = product_id(page.products(), &product);
            page.orders_mut().open_create();
            if let Some(form) = page.orders_mut().form_mut() {
                form.customer_email = email;
                form.product_id = product;
                form.quantity = quantity;
                form.status = status;
            }
            let result = page.save().await;
            finish(result, page.orders(), "Order added")?;
        }
        SalesAction::Edit {
            order_number,
            email,
            product,
            quantity,
            status,
        } => {
            let status = status.map(|s| s.parse::<SalesStatus>()).transpose()?;
            let product = product.map(|p| product_id(page.products(), &p));
            open_for_edit(page.orders_mut(), &order_number)?;
            if let Some(form) = page.orders_mut().form_mut() {
                set(&mut form.customer_email, email);
                set(&mut form.product_id, product);
                set(&mut form.quantity, quantity);
                set(&mut form.status, status);
            }
            let result = page.save().await;
            finish(result, page.orders(), "Order updated")?;
        }
        SalesAction::Delete { order_number, yes } => {
            delete(page.orders_mut(), &order_number, yes).await?
        }
    }
    Ok(())
}

async fn purchases(app: &mut App, action: PurchaseAction, json: bool) -> anyhow::Result<()> {
    require(app, Route::PurchaseOrders)?;
    let mut page = app.purchase_orders_page();
    load(page.refresh().await, page.orders().error())?;

    match action {
        PurchaseAction::List {
            search,
            supplier,
            status,
        } => {
            page.set_supplier_filter(supplier);
            page.set_status_filter(status.parse::<StatusFilter<PurchaseStatus>>()?);
            page.orders_mut().set_search(search.unwrap_or_default());
            let rows = page.filtered();
            if json {
                print_json(&rows)?;
            } else {
                println!("{}", render::purchase_orders(&rows));
            }
        }
        PurchaseAction::Add {
            supplier,
            product,
            quantity,
            price,
            status,
        } => {
            let status: PurchaseStatus = status.parse()?;
            let supplier = supplier_id(page.suppliers(), &supplier);
            let product = product_id(page.products(), &product);
            page.orders_mut().open_create();
            if let Some(form) = page.orders_mut().form_mut() {
                form.supplier_id = supplier;
                form.product_id = product;
                form.product_quantity = quantity;
                form.product_price = price;
                form.status = status;
            }
            let result = page.save().await;
            finish(result, page.orders(), "Purchase order added")?;
        }
        PurchaseAction::Edit {
            id,
            supplier,
            product,
            quantity,
            price,
            status,
        } => {
            let status = status.map(|s| s.parse::<PurchaseStatus>()).transpose()?;
            let supplier = supplier.map(|s| supplier_id(page.suppliers(), &s));
            let product = product.map(|p| product_id(page.products(), &p));
            open_for_edit(page.orders_mut(), &id)?;
            if let Some(form) = page.orders_mut().form_mut() {
                set(&mut form.supplier_id, supplier);
                set(&mut form.product_id, product);
                set(&mut form.product_quantity, quantity);
                set(&mut form.product_price, price);
                set(&mut form.status, status);
            }
            let result = page.save().await;
            finish(result, page.orders(), "Purchase order updated")?;
        }
        PurchaseAction::Delete { id, yes } => delete(page.orders_mut(), &id, yes).await?,
    }
    Ok(())
}

async fn suppliers(app: &mut App, action: SupplierAction, json: bool) -> anyhow::Result<()> {
    require(app, Route::Suppliers)?;
    let mut page = app.suppliers_page();
    load(page.refresh().await, page.error())?;

    match action {
        SupplierAction::List { search } => {
            page.set_search(search.unwrap_or_default());
            let rows = page.filtered();
            if json {
                print_json(&rows)?;
            } else {
                println!("{}", render::suppliers(&rows));
            }
        }
        SupplierAction::Add {
            company,
            contact,
            email,
        } => {
            page.open_create();
            if let Some(form) = page.form_mut() {
                form.company_name = company;
                form.contact_person = contact;
                form.contact_email = email;
            }
            finish(page.save(&()).await, &page, "Supplier added")?;
        }
        SupplierAction::Edit {
            id,
            company,
            contact,
            email,
        } => {
            open_for_edit(&mut page, &id)?;
            if let Some(form) = page.form_mut() {
                set(&mut form.company_name, company);
                set(&mut form.contact_person, contact);
                set(&mut form.contact_email, email);
            }
            finish(page.save(&()).await, &page, "Supplier updated")?;
        }
        SupplierAction::Delete { id, yes } => delete(&mut page, &id, yes).await?,
    }
    Ok(())
}

/// Stop unless the access gate would render `route`
fn require(app: &mut App, route: Route) -> anyhow::Result<()> {
    match app.open(route.path()) {
        Resolution::Render(_) => Ok(()),
        Resolution::Redirect(Route::Login) => bail!("Not signed in. Run `sunflow login <email>` first."),
        other => bail!("Cannot open {}: {:?}", route, other),
    }
}

fn load<T>(result: sunflow::ViewResult<T>, message: Option<&str>) -> anyhow::Result<T> {
    result.map_err(|e| anyhow::anyhow!(message.map(str::to_string).unwrap_or_else(|| e.user_message())))
}

fn finish<E: Entity>(
    result: sunflow::ViewResult<()>,
    page: &Collection<E>,
    done: &str,
) -> anyhow::Result<()> {
    load(result, page.error())?;
    println!("{}", done);
    Ok(())
}

fn open_for_edit<E: Entity>(page: &mut Collection<E>, key: &E::Key) -> anyhow::Result<()> {
    if !page.open_edit_key(key) {
        bail!("No {} with key {}", E::NOUN, key);
    }
    Ok(())
}

async fn delete<E: Entity>(page: &mut Collection<E>, key: &E::Key, yes: bool) -> anyhow::Result<()> {
    let deleted = if yes {
        page.remove(key, &|_: &str| true).await
    } else {
        page.remove(key, &confirm_on_stdin).await
    };
    let message = page.error().map(str::to_string);
    match deleted {
        Ok(true) => println!("Deleted"),
        Ok(false) => println!("Cancelled"),
        Err(e) => bail!("{}", message.unwrap_or_else(|| e.user_message())),
    }
    Ok(())
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Accept an id or an exact (case-insensitive) name
fn product_id(options: &[ProductOption], input: &str) -> String {
    options
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(input.trim()))
        .map(|p| p.id.to_string())
        .unwrap_or_else(|| input.trim().to_string())
}

fn supplier_id(options: &[SupplierOption], input: &str) -> String {
    options
        .iter()
        .find(|s| s.company_name.eq_ignore_ascii_case(input.trim()))
        .map(|s| s.id.to_string())
        .unwrap_or_else(|| input.trim().to_string())
}

fn section_json<T: Serialize>(section: Option<&Result<T, String>>) -> Value {
    match section {
        Some(Ok(value)) => serde_json::to_value(value).unwrap_or(Value::Null),
        Some(Err(message)) => json!({ "error": message }),
        None => Value::Null,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Give the session listener a moment to load the profile
async fn wait_for_profile(app: &App) {
    let mut rx = app.session().subscribe_profile();
    let _ = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|p| p.is_some())).await;
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}: ", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm_on_stdin(question: &str) -> bool {
    match prompt(&format!("{} [y/N]", question)) {
        Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
