//! Cart commands.

use clap::Args;
use iconique_core::{LineItem, LineRef, Price, PricingSummary};
use rust_decimal::Decimal;

use super::{CliError, Context};

/// A product to put in the cart.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Product id
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price in rupees
    #[arg(value_parser = crate::parse_price)]
    pub price: Decimal,

    /// Product image URL or path
    #[arg(long, default_value = "")]
    pub image: String,
}

impl ProductArgs {
    fn into_item(self) -> LineItem {
        LineItem::new(self.id, self.name, self.price, self.image)
    }
}

/// A reference to one cart line.
#[derive(Debug, Args)]
pub struct LineArgs {
    /// Product id, or zero-based position with `--index`
    pub line: String,

    /// Treat LINE as a position instead of a product id
    #[arg(long)]
    pub index: bool,
}

impl LineArgs {
    fn line_ref(&self) -> Result<LineRef, CliError> {
        if self.index {
            self.line
                .parse::<usize>()
                .map(LineRef::Index)
                .map_err(|_| CliError::NoSuchLine(self.line.clone()))
        } else {
            Ok(LineRef::from(self.line.as_str()))
        }
    }
}

/// Print the cart, its totals and the active promo code.
#[allow(clippy::print_stdout)]
pub fn show(ctx: &Context) -> Result<(), CliError> {
    let cart = ctx.cart().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }

    for (index, item) in cart.items().iter().enumerate() {
        println!(
            "[{index}] {:<12} {:<32} {:>3} x {:>12} = {:>12}",
            item.id,
            item.name,
            item.quantity,
            Price::pkr(item.price).to_string(),
            item.line_total()
                .map_or_else(String::new, |total| Price::pkr(total).to_string()),
        );
    }

    let promo = ctx.cart_promo().active();
    let summary = ctx.cart().summary(promo.as_ref().map(|applied| applied.rate));
    println!();
    println!("Items: {}", ctx.cart().item_count());
    if let Some(applied) = &promo {
        println!("Promo: {} ({}% off)", applied.code, applied.rate.percent());
    }
    print_summary(&summary);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &PricingSummary) {
    println!("Subtotal: {}", Price::pkr(summary.subtotal));
    if summary.discount_amount > Decimal::ZERO {
        println!("Discount: -{}", Price::pkr(summary.discount_amount));
    }
    if summary.ships_free() {
        println!("Shipping: FREE");
    } else {
        println!("Shipping: {}", Price::pkr(summary.shipping_fee));
    }
    println!("Total: {}", Price::pkr(summary.total));
}

/// Add a product to the cart.
#[allow(clippy::print_stdout)]
pub fn add(ctx: &Context, product: ProductArgs, quantity: u32) -> Result<(), CliError> {
    if !ctx.cart().add(product.into_item(), quantity)? {
        return Err(CliError::TotalTooLarge);
    }
    println!("Added to cart ({} item(s))", ctx.cart().item_count());
    Ok(())
}

/// Remove a line from the cart.
#[allow(clippy::print_stdout)]
pub fn remove(ctx: &Context, line: &LineArgs) -> Result<(), CliError> {
    if !ctx.cart().remove(&line.line_ref()?)? {
        return Err(CliError::NoSuchLine(line.line.clone()));
    }
    println!("Removed from cart ({} item(s))", ctx.cart().item_count());
    Ok(())
}

/// Set the quantity of a line.
#[allow(clippy::print_stdout)]
pub fn set_quantity(ctx: &Context, line: &LineArgs, quantity: i64) -> Result<(), CliError> {
    let line_ref = existing_line(ctx, line)?;
    if !ctx.cart().set_quantity(&line_ref, quantity)? {
        return Err(CliError::TotalTooLarge);
    }
    println!("Cart updated ({} item(s))", ctx.cart().item_count());
    Ok(())
}

/// Add one unit to a line.
#[allow(clippy::print_stdout)]
pub fn increment(ctx: &Context, line: &LineArgs) -> Result<(), CliError> {
    let line_ref = existing_line(ctx, line)?;
    if !ctx.cart().increment(&line_ref)? {
        return Err(CliError::TotalTooLarge);
    }
    println!("Cart updated ({} item(s))", ctx.cart().item_count());
    Ok(())
}

/// Take one unit from a line, keeping at least one.
#[allow(clippy::print_stdout)]
pub fn decrement(ctx: &Context, line: &LineArgs) -> Result<(), CliError> {
    let line_ref = existing_line(ctx, line)?;
    ctx.cart().decrement(&line_ref)?;
    println!("Cart updated ({} item(s))", ctx.cart().item_count());
    Ok(())
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub fn clear(ctx: &Context) -> Result<(), CliError> {
    ctx.cart().clear()?;
    println!("Cart cleared");
    Ok(())
}

/// Replace the cart with a single product.
#[allow(clippy::print_stdout)]
pub fn buy_now(ctx: &Context, product: ProductArgs, quantity: u32) -> Result<(), CliError> {
    if !ctx.cart().replace_with(product.into_item(), quantity)? {
        return Err(CliError::TotalTooLarge);
    }
    println!("Cart now holds only this product; run `iconique checkout` to order");
    Ok(())
}

fn existing_line(ctx: &Context, line: &LineArgs) -> Result<LineRef, CliError> {
    let line_ref = line.line_ref()?;
    if ctx.cart().snapshot().get(&line_ref).is_none() {
        return Err(CliError::NoSuchLine(line.line.clone()));
    }
    Ok(line_ref)
}
