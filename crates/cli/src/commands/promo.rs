//! Cart page promo code commands.

use super::{CliError, Context};

/// Apply a promo code to the cart page.
#[allow(clippy::print_stdout)]
pub fn apply(ctx: &Context, code: &str) -> Result<(), CliError> {
    let slot = ctx.cart_promo();
    let applied = slot.apply(code, ctx.cart().snapshot().subtotal())?;
    println!("{}", slot.confirmation(&applied));
    Ok(())
}

/// Remove the active cart page promo code.
#[allow(clippy::print_stdout)]
pub fn clear(ctx: &Context) -> Result<(), CliError> {
    ctx.cart_promo().clear()?;
    println!("Promo code removed");
    Ok(())
}
