//! Placed orders commands.

use iconique_core::Price;

use super::{CliError, Context};

/// Print every placed order, oldest first.
#[allow(clippy::print_stdout)]
pub fn list(ctx: &Context) -> Result<(), CliError> {
    let orders = ctx.orders().list()?;
    if orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }

    for order in &orders {
        println!(
            "{}  {}  {:<24}  {:>3} item(s)  {:>14}  {}",
            order.order_id(),
            order.order_date().format("%Y-%m-%d %H:%M"),
            order.customer().full_name(),
            order.items().iter().map(|item| u64::from(item.quantity)).sum::<u64>(),
            Price::pkr(order.total()).to_string(),
            order.status(),
        );
    }
    println!("{} order(s)", orders.len());
    Ok(())
}
