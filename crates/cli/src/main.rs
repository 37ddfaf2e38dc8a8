//! The Iconique CLI - a command-line shopping client.
//!
//! Each invocation is one browsing context: the cart, the cart-page promo
//! code and the orders list persist in the data directory, while the
//! checkout discount lives only for the duration of the `checkout` command.
//!
//! # Usage
//!
//! ```bash
//! # Put two lipsticks in the cart and look at it
//! iconique cart add p-101 "Velvet Matte Lipstick" 1250 --quantity 2
//! iconique cart show
//!
//! # Apply a cart-page promo code
//! iconique promo apply save20
//!
//! # Place a cash-on-delivery order and email the confirmation
//! iconique checkout --first-name Zara --last-name Ahmed --phone "+92 321 0000000" \
//!     --email zara@example.com --city Lahore --address "45 Gulberg III" \
//!     --accept-terms --discount WELCOME20 --notify
//!
//! # List placed orders
//! iconique orders list
//! ```
//!
//! # Environment Variables
//!
//! - `ICONIQUE_DATA_DIR` - directory holding the persisted records
//! - `ICONIQUE_API_URL` - base URL of the order email service

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "iconique")]
#[command(author, version, about = "The Iconique shopping client")]
struct Cli {
    /// Directory for the cart, promo code and orders records
    #[arg(long, env = "ICONIQUE_DATA_DIR", default_value = ".iconique", global = true)]
    data_dir: PathBuf,

    /// Base URL of the order email service
    #[arg(
        long,
        env = "ICONIQUE_API_URL",
        default_value = "http://127.0.0.1:5000",
        global = true
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the cart page promo code
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
    /// Place a cash-on-delivery order for the cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Inspect placed orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with its totals
    Show,
    /// Add a product (merges with an existing line)
    Add {
        #[command(flatten)]
        product: commands::cart::ProductArgs,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove(commands::cart::LineArgs),
    /// Set a line's quantity (values below 1 become 1)
    SetQty {
        #[command(flatten)]
        line: commands::cart::LineArgs,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Add one unit to a line
    Inc(commands::cart::LineArgs),
    /// Take one unit from a line (never below 1)
    Dec(commands::cart::LineArgs),
    /// Empty the cart
    Clear,
    /// Replace the cart with a single product
    BuyNow {
        #[command(flatten)]
        product: commands::cart::ProductArgs,

        /// Units to buy
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
}

#[derive(Subcommand)]
enum PromoAction {
    /// Apply a promo code to the cart
    Apply {
        /// Promo code (case-insensitive)
        code: String,
    },
    /// Remove the active promo code
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List placed orders, oldest first
    List,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let ctx = commands::Context::open(&cli.data_dir)?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { product, quantity } => commands::cart::add(&ctx, product, quantity),
            CartAction::Remove(line) => commands::cart::remove(&ctx, &line),
            CartAction::SetQty { line, quantity } => {
                commands::cart::set_quantity(&ctx, &line, quantity)
            }
            CartAction::Inc(line) => commands::cart::increment(&ctx, &line),
            CartAction::Dec(line) => commands::cart::decrement(&ctx, &line),
            CartAction::Clear => commands::cart::clear(&ctx),
            CartAction::BuyNow { product, quantity } => {
                commands::cart::buy_now(&ctx, product, quantity)
            }
        },
        Commands::Promo { action } => match action {
            PromoAction::Apply { code } => commands::promo::apply(&ctx, &code),
            PromoAction::Clear => commands::promo::clear(&ctx),
        },
        Commands::Checkout(args) => commands::checkout::run(&ctx, &args, &cli.api_url).await,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&ctx),
        },
    }
}

/// Parse a non-negative price such as `1250` or `899.50`.
fn parse_price(raw: &str) -> Result<Decimal, String> {
    let price: Decimal = raw.parse().map_err(|e| format!("invalid price: {e}"))?;
    if price < Decimal::ZERO {
        return Err("price cannot be negative".to_string());
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("899.50"), Ok(Decimal::new(89950, 2)));
        assert!(parse_price("-1").is_err());
        assert!(parse_price("cheap").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
