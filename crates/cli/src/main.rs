//! Shopfront CLI - Browse the catalog, manage the cart, and start checkout.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! shopfront products --limit 10 --type "Donning Sock"
//!
//! # Show one product
//! shopfront product donning-sock
//!
//! # Manage the cart
//! shopfront cart add donning-sock --quantity 2
//! shopfront cart update gid://shopify/ProductVariant/1 3
//! shopfront cart show
//!
//! # Create a checkout for the cart
//! shopfront checkout
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE` - Store domain (`example.myshopify.com`)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API token
//! - `SHOPFRONT_CART_DIR` - Where the cart is persisted (default `.shopfront`)
//! - `SENTRY_DSN` - Optional error reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_storefront::catalog::ProductFilter;
use shopfront_storefront::config::StorefrontConfig;
use shopfront_storefront::error::Result;
use shopfront_storefront::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Maximum number of products (1-250)
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show a single product by handle
    Product {
        /// Product handle
        handle: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Create a checkout for the current cart
    Checkout,
}

/// At most one filter may be given.
#[derive(Args, Default)]
#[group(multiple = false)]
struct FilterArgs {
    /// Products with this tag
    #[arg(long)]
    tag: Option<String>,

    /// Products of this product type
    #[arg(long = "type")]
    product_type: Option<String>,

    /// Products from this vendor
    #[arg(long)]
    vendor: Option<String>,

    /// Products in the collection with this handle
    #[arg(long)]
    collection: Option<String>,

    /// Raw Storefront search query
    #[arg(long)]
    query: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> Option<ProductFilter> {
        self.tag
            .map(ProductFilter::Tag)
            .or_else(|| self.product_type.map(ProductFilter::ProductType))
            .or_else(|| self.vendor.map(ProductFilter::Vendor))
            .or_else(|| self.collection.map(ProductFilter::Collection))
            .or_else(|| self.query.map(ProductFilter::Query))
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product handle
        handle: String,

        /// Variant ID (defaults to the first available variant)
        #[arg(short, long)]
        variant: Option<String>,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a cart line (0 or less removes it)
    Update {
        /// Variant ID
        variant: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Variant ID
        variant: String,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_storefront=info,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        e.report();
        output::error(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<()> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Products { limit, filter } => {
            commands::products::list(&state, limit, filter.into_filter().as_ref()).await?;
        }
        Commands::Product { handle } => commands::products::show(&state, &handle).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add {
                handle,
                variant,
                quantity,
            } => commands::cart::add(&state, &handle, variant.as_deref(), quantity).await?,
            CartAction::Update { variant, quantity } => {
                commands::cart::update(&state, &variant, quantity);
            }
            CartAction::Remove { variant } => commands::cart::remove(&state, &variant),
            CartAction::Clear => commands::cart::clear(&state),
        },
        Commands::Checkout => commands::checkout::run(&state).await?,
    }
    Ok(())
}
