//! Vunjabei CLI - terminal front-end for the shop.
//!
//! # Usage
//!
//! ```bash
//! # Check the backend is up
//! vb status
//!
//! # Sign in (password from --password, $VUNJABEI_PASSWORD or a prompt)
//! vb login alice
//!
//! # Browse and order
//! vb products list
//! vb order place 7 --quantity 2 --phone 0712345678 --address "Plot 4, Mwenge"
//! vb orders mine
//!
//! # Staff
//! vb dashboard
//! vb orders set-status 12 shipped
//! vb products delete 7
//! ```
//!
//! Every screen-like command is routed through the access controller first,
//! so a customer cannot open a staff screen and vice versa.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use vunjabei_core::{CategoryId, OrderId, OrderStatus, Price, ProductId};

mod commands;
mod render;

use commands::{App, CliError};

#[derive(Parser)]
#[command(name = "vb")]
#[command(author, version, about = "Vunjabei shop from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Status,
    /// Sign in
    Login {
        /// Username or email
        username: String,

        #[arg(long, env = "VUNJABEI_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Screen to open after signing in
        #[arg(long)]
        next: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Create a customer account
    Register(RegisterArgs),
    /// Show the signed-in account
    Whoami,
    /// Resolve a screen path for the current session
    Open {
        /// Path such as /admin/orders or /customer/products/7
        path: String,
    },
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories (staff)
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Place an order (customer)
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// List orders and change their status
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage staff accounts (staff)
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Staff overview
    Dashboard,
}

#[derive(clap::Args)]
struct RegisterArgs {
    username: String,

    #[arg(short, long, default_value = "")]
    email: String,

    #[arg(long, env = "VUNJABEI_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(long)]
        category: Option<CategoryId>,
    },
    /// Show one product
    Show { id: ProductId },
    /// List products with fewer than ten units (staff)
    LowStock,
    /// Add a product (staff)
    Create(ProductArgs),
    /// Replace a product's fields (staff)
    Update {
        id: ProductId,
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product (staff)
    Delete {
        id: ProductId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(short, long)]
    name: String,

    /// Price in TSh
    #[arg(short, long)]
    price: Price,

    /// Units in stock
    #[arg(short, long)]
    quantity: u32,

    #[arg(short, long)]
    category: Option<CategoryId>,

    /// Image file to upload
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories
    List,
    /// Add a category
    Create { name: String },
    /// Rename a category
    Rename { id: CategoryId, name: String },
    /// Delete a category; its products become uncategorized
    Delete {
        id: CategoryId,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Order a product
    Place {
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Your order history (customer)
    Mine,
    /// Every order in the shop (staff)
    List {
        /// Only orders with this status
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Change an order's status (staff)
    SetStatus {
        id: OrderId,
        status: OrderStatus,
        /// Allow changing an order that is already delivered or cancelled
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff account
    Register(RegisterArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vunjabei_cli=info,vunjabei_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            render::failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = App::from_env()?;

    match cli.command {
        Commands::Status => commands::auth::status(&app).await?,
        Commands::Login {
            username,
            password,
            next,
        } => {
            let password = commands::password(password, "Password")?;
            commands::auth::login(&app, &username, &password, next.as_deref()).await?;
        }
        Commands::Logout => commands::auth::logout(&app)?,
        Commands::Register(args) => {
            let (password, confirmation) = passwords(args.password)?;
            commands::auth::register(&app, &args.username, &args.email, password, &confirmation)
                .await?;
        }
        Commands::Whoami => commands::auth::whoami(&app),
        Commands::Open { path } => commands::auth::open(&app, &path),
        Commands::Products { action } => match action {
            ProductAction::List { category } => commands::catalog::list(&app, category).await?,
            ProductAction::Show { id } => commands::catalog::show(&app, id).await?,
            ProductAction::LowStock => commands::catalog::low_stock(&app).await?,
            ProductAction::Create(fields) => {
                let form = commands::catalog::form(fields.into()).await?;
                commands::catalog::create(&app, &form).await?;
            }
            ProductAction::Update { id, fields } => {
                let form = commands::catalog::form(fields.into()).await?;
                commands::catalog::update(&app, id, &form).await?;
            }
            ProductAction::Delete { id, yes } => commands::catalog::delete(&app, id, yes).await?,
        },
        Commands::Categories { action } => match action {
            CategoryAction::List => commands::catalog::list_categories(&app).await?,
            CategoryAction::Create { name } => {
                commands::catalog::create_category(&app, &name).await?;
            }
            CategoryAction::Rename { id, name } => {
                commands::catalog::rename_category(&app, id, &name).await?;
            }
            CategoryAction::Delete { id, yes } => {
                commands::catalog::delete_category(&app, id, yes).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::Place {
                product,
                quantity,
                phone,
                address,
            } => {
                commands::orders::place(&app, product, quantity, phone, address).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::Mine => commands::orders::mine(&app).await?,
            OrdersAction::List { status } => commands::orders::list(&app, status).await?,
            OrdersAction::SetStatus { id, status, force } => {
                commands::orders::set_status(&app, id, status, force).await?;
            }
        },
        Commands::Staff { action } => match action {
            StaffAction::Register(args) => {
                let (password, confirmation) = passwords(args.password)?;
                commands::auth::register_staff(
                    &app,
                    &args.username,
                    &args.email,
                    password,
                    &confirmation,
                )
                .await?;
            }
        },
        Commands::Dashboard => commands::dashboard::show(&app).await?,
    }
    Ok(())
}

/// Password and confirmation. A password given on the command line or in the
/// environment counts as confirmed.
fn passwords(given: Option<String>) -> Result<(SecretString, SecretString), CliError> {
    match given {
        Some(password) => Ok((
            SecretString::from(password.clone()),
            SecretString::from(password),
        )),
        None => Ok((
            commands::password(None, "Password")?,
            commands::password(None, "Confirm password")?,
        )),
    }
}

impl From<ProductArgs> for commands::catalog::ProductInput {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            price: args.price,
            quantity: args.quantity,
            category: args.category,
            image: args.image,
        }
    }
}
