//! Turning a cart and a shipping form into a placed order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use iconique_core::{AppliedDiscount, Order, OrderId, ShippingForm, ValidationError};
use thiserror::Error;

use crate::cart_store::CartStore;
use crate::discount::DiscountSlot;
use crate::order_log::OrderLog;
use crate::storage::StorageError;

/// Reasons an order could not be placed. Nothing is written in any case.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty. Please add items before checkout")]
    EmptyCart,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not save order: {0}")]
    Storage(#[from] StorageError),
}

/// Places orders for one browsing context.
pub struct OrderBuilder {
    cart: Arc<CartStore>,
    orders: OrderLog,
    discount_slot: Option<DiscountSlot>,
    clock: fn() -> DateTime<Utc>,
}

impl OrderBuilder {
    #[must_use]
    pub fn new(cart: Arc<CartStore>, orders: OrderLog) -> Self {
        Self {
            cart,
            orders,
            discount_slot: None,
            clock: Utc::now,
        }
    }

    /// Clear this slot after every successful order.
    #[must_use]
    pub fn with_discount_slot(mut self, slot: DiscountSlot) -> Self {
        self.discount_slot = Some(slot);
        self
    }

    /// Stamp orders with a fixed clock.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// The orders placed so far.
    #[must_use]
    pub const fn orders(&self) -> &OrderLog {
        &self.orders
    }

    /// Place an order for the current cart.
    ///
    /// Steps, in order: reject an empty cart, validate the form, price the
    /// cart with `discount`, build the order, append it to the orders list,
    /// then clear the cart and the discount slot.
    ///
    /// The order is committed once it is appended. A failure to clear the
    /// cart afterwards is logged and does not undo the order.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if the cart has no lines
    /// - [`CheckoutError::Validation`] for the first invalid form field
    /// - [`CheckoutError::Storage`] if the order cannot be appended
    #[tracing::instrument(skip_all, fields(items = tracing::field::Empty))]
    pub fn place_order(
        &self,
        form: &ShippingForm,
        discount: Option<&AppliedDiscount>,
    ) -> Result<Order, CheckoutError> {
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        tracing::Span::current().record("items", cart.len());

        let (customer, address) = form.validate()?;
        let pricing = self
            .cart
            .policy()
            .summarize(&cart, discount.map(|applied| applied.rate));

        let order_date = (self.clock)();
        let order = Order::build(
            OrderId::generate_at(order_date, &mut rand::rng()),
            customer,
            address,
            &cart,
            &pricing,
            order_date,
        );

        self.orders.append(&order)?;
        tracing::info!(order_id = %order.order_id(), total = %order.total(), "order placed");

        if let Err(e) = self.cart.clear() {
            tracing::warn!(order_id = %order.order_id(), error = %e, "order saved but cart not cleared");
        }
        if let Some(slot) = &self.discount_slot
            && let Err(e) = slot.clear()
        {
            tracing::warn!(order_id = %order.order_id(), error = %e, "order saved but discount not cleared");
        }

        Ok(order)
    }
}

impl std::fmt::Debug for OrderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBuilder")
            .field("cart", &self.cart)
            .field("discount_slot", &self.discount_slot)
            .finish_non_exhaustive()
    }
}
