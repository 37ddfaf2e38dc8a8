//! Pricing rules: subtotal, discount, shipping and total.
//!
//! ```text
//! subtotal            = Σ price * quantity
//! discount_amount     = subtotal * rate
//! discounted_subtotal = subtotal - discount_amount
//! shipping_fee        = fee if discounted_subtotal < threshold else 0
//! total               = discounted_subtotal + shipping_fee
//! ```
//!
//! Every value is an exact decimal; rounding happens only when a
//! [`Price`](crate::Price) is formatted. A [`Cart`] keeps its subtotal
//! representable, and the shipping fee saturates at [`Decimal::MAX`] rather
//! than overflowing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::promo::DiscountRate;

/// Flat shipping fee charged below the free-shipping threshold (PKR).
pub const DEFAULT_SHIPPING_FEE: i64 = 250;

/// Discounted subtotal at which shipping becomes free (PKR).
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 3000;

/// Shipping policy applied on top of the discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Flat fee charged when the discounted subtotal is below the threshold.
    pub shipping_fee: Decimal,
    /// Discounted subtotal from which shipping is free (inclusive).
    pub free_shipping_threshold: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Decimal::from(DEFAULT_SHIPPING_FEE),
            free_shipping_threshold: Decimal::from(DEFAULT_FREE_SHIPPING_THRESHOLD),
        }
    }
}

impl PricingPolicy {
    /// Shipping fee for a given discounted subtotal.
    ///
    /// The fee applies strictly below the threshold; reaching the threshold
    /// exactly ships for free.
    #[must_use]
    pub fn shipping_for(&self, discounted_subtotal: Decimal) -> Decimal {
        if discounted_subtotal < self.free_shipping_threshold {
            self.shipping_fee
        } else {
            Decimal::ZERO
        }
    }

    /// Price a cart under an optional discount.
    #[must_use]
    pub fn summarize(&self, cart: &Cart, discount: Option<DiscountRate>) -> PricingSummary {
        let subtotal = cart.subtotal();
        let discount_amount =
            discount.map_or(Decimal::ZERO, |rate| subtotal.saturating_mul(rate.value()));
        let discounted_subtotal = subtotal.saturating_sub(discount_amount);
        let shipping_fee = self.shipping_for(discounted_subtotal);

        PricingSummary {
            subtotal,
            discount_amount,
            discounted_subtotal,
            shipping_fee,
            total: discounted_subtotal.saturating_add(shipping_fee),
        }
    }
}

/// Derived totals for a cart. Never stored on its own; recompute it whenever
/// the cart or the active discount changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discounted_subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl PricingSummary {
    /// Whether shipping is free for this summary.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping_fee.is_zero()
    }
}

/// Price a cart under the default policy.
#[must_use]
pub fn summarize(cart: &Cart, discount: Option<DiscountRate>) -> PricingSummary {
    PricingPolicy::default().summarize(cart, discount)
}
