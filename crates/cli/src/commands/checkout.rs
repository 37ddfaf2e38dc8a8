//! Checkout command.
//!
//! Places a cash-on-delivery order for the persisted cart. With `--notify`
//! the order is then sent to the email service; a notification failure is
//! reported but never undoes the order.

use clap::Args;
use iconique_checkout::{CheckoutError, OrderBuilder, OrderNotifier};
use iconique_core::{Order, Price, ShippingForm};

use super::{CliError, Context};

/// Shipping details and options for `iconique checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Phone number (digits, spaces, `+ - ( )`)
    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, default_value = "Pakistan")]
    pub country: String,

    #[arg(long)]
    pub city: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    /// Apartment, suite or floor
    #[arg(long, default_value = "")]
    pub apartment: String,

    #[arg(long, default_value = "")]
    pub postal_code: String,

    /// Accept the terms and conditions
    #[arg(long)]
    pub accept_terms: bool,

    /// Checkout discount code
    #[arg(long)]
    pub discount: Option<String>,

    /// Email the confirmation through the order email service
    #[arg(long)]
    pub notify: bool,
}

impl CheckoutArgs {
    fn form(&self) -> ShippingForm {
        ShippingForm {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            apartment: self.apartment.clone(),
            postal_code: self.postal_code.clone(),
            accept_terms: self.accept_terms,
        }
    }
}

/// Place the order and optionally notify the email service.
#[allow(clippy::print_stdout)]
pub async fn run(ctx: &Context, args: &CheckoutArgs, api_url: &str) -> Result<(), CliError> {
    let slot = ctx.checkout_discount();
    if let Some(code) = &args.discount {
        let applied = slot.apply(code, ctx.cart().snapshot().subtotal())?;
        println!("{}", slot.confirmation(&applied));
    }
    let discount = slot.active();

    let builder =
        OrderBuilder::new(std::sync::Arc::clone(ctx.cart()), ctx.orders()).with_discount_slot(slot);
    let order = match builder.place_order(&args.form(), discount.as_ref()) {
        Ok(order) => order,
        Err(CheckoutError::Validation(e)) => {
            println!("{}: {e}", e.field());
            return Err(CheckoutError::Validation(e).into());
        }
        Err(e) => return Err(e.into()),
    };

    print_confirmation(&order);

    if args.notify {
        notify(&order, api_url).await;
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_confirmation(order: &Order) {
    println!("Order placed successfully!");
    println!("Order ID: {}", order.order_id());
    println!("Subtotal: {}", Price::pkr(order.subtotal()));
    if !order.discount().is_zero() {
        println!("Discount: -{}", Price::pkr(order.discount()));
    }
    if order.shipping().is_zero() {
        println!("Shipping: FREE");
    } else {
        println!("Shipping: {}", Price::pkr(order.shipping()));
    }
    println!("Total: {}", Price::pkr(order.total()));
    println!("Payment: {}", order.payment_method().label());
}

#[allow(clippy::print_stdout)]
async fn notify(order: &Order, api_url: &str) {
    let result = match OrderNotifier::new(api_url) {
        Ok(notifier) => notifier.send(order).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => println!("{}", response.message),
        Err(e) => {
            tracing::warn!(order_id = %order.order_id(), error = %e, "order placed but emails not sent");
            println!("Your order is saved, but the confirmation email could not be sent");
        }
    }
}
