//! Lumière CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! lumiere products list --first 5
//! lumiere products show vanilla-bean
//! lumiere collections show best-sellers
//!
//! # Search
//! lumiere search soy wax
//! lumiere suggest vani
//! lumiere recent
//!
//! # Cart (the cart id is kept in $LUMIERE_STORAGE between runs)
//! lumiere cart add gid://shopify/ProductVariant/123 --quantity 2
//! lumiere cart show
//! lumiere cart checkout
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE_DOMAIN` - Store domain (e.g. `lumiere.myshopify.com`)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API token
//! - `SHOPIFY_API_VERSION` - Storefront API version (default `2024-01`)
//! - `FREE_SHIPPING_THRESHOLD` - Free shipping threshold (default 75)
//! - `LUMIERE_STORAGE` - Storage file (default `.lumiere/storage.json`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{CliError, Context, OutputFormat};

#[derive(Parser)]
#[command(name = "lumiere")]
#[command(author, version, about = "Lumière storefront CLI")]
struct Cli {
    /// File holding the cart id and recent searches
    #[arg(
        long,
        env = "LUMIERE_STORAGE",
        default_value = ".lumiere/storage.json",
        global = true
    )]
    storage: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Browse collections
    Collections {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Full product search
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Type-ahead suggestions
    Suggest {
        /// Partial input
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Recent searches (popular searches when there are none)
    Recent {
        /// Forget recent searches
        #[arg(long)]
        clear: bool,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List one page of products
    List {
        #[arg(long, default_value_t = 12)]
        first: i64,
        /// Cursor from a previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// Show a product by handle
    Show { handle: String },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// List collections
    List {
        #[arg(long, default_value_t = 20)]
        first: i64,
    },
    /// Show a collection and its products
    Show {
        handle: String,
        #[arg(long, default_value_t = 12)]
        first: i64,
        #[arg(long)]
        after: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Add a variant
    Add {
        /// Variant GID
        variant_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
        /// Selling plan GID for a subscription
        #[arg(long)]
        selling_plan: Option<String>,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        /// Cart line GID
        line_id: String,
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Cart line GID
        line_id: String,
    },
    /// Replace the cart's discount codes
    Discount {
        /// Codes to apply; none clears them
        codes: Vec<String>,
    },
    /// Print the checkout URL
    Checkout,
}

#[tokio::main]
async fn main() {
    // Initialize tracing (stderr, so output stays pipeable)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lumiere_cli=warn,lumiere_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // .env may set LUMIERE_STORAGE, so load it before parsing
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{output}");
            }
        }
        Err(e) => {
            tracing::error!("Command failed: {e}");
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let ctx = Context::from_env(cli.storage, cli.format)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List { first, after } => {
                commands::catalog::list_products(&ctx, first, after).await
            }
            ProductAction::Show { handle } => commands::catalog::show_product(&ctx, &handle).await,
        },
        Commands::Collections { action } => match action {
            CollectionAction::List { first } => {
                commands::catalog::list_collections(&ctx, first).await
            }
            CollectionAction::Show {
                handle,
                first,
                after,
            } => commands::catalog::show_collection(&ctx, &handle, first, after).await,
        },
        Commands::Search { query } => commands::search::search(&ctx, &query.join(" ")).await,
        Commands::Suggest { query } => commands::search::suggest(&ctx, &query.join(" ")).await,
        Commands::Recent { clear } => commands::search::recent(&ctx, clear),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await,
            CartAction::Add {
                variant_id,
                quantity,
                selling_plan,
            } => commands::cart::add(&ctx, variant_id, quantity, selling_plan).await,
            CartAction::Update { line_id, quantity } => {
                commands::cart::update(&ctx, line_id, quantity).await
            }
            CartAction::Remove { line_id } => commands::cart::remove(&ctx, line_id).await,
            CartAction::Discount { codes } => commands::cart::discount(&ctx, codes).await,
            CartAction::Checkout => commands::cart::checkout(&ctx).await,
        },
    }
}
