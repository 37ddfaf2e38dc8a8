//! Storage keys for the shopper's persisted state.
//!
//! The key names follow the web storefront, but the discount records are
//! richer: both hold an [`AppliedDiscount`](iconique_core::AppliedDiscount)
//! as JSON rather than the storefront's own shapes.

/// Persisted cart, a JSON array of line items (local storage).
pub const CART: &str = "cart";

/// Append-only list of placed orders (local storage).
pub const ORDERS: &str = "orders";

/// Active cart-page promo code (local storage).
pub const CART_PROMO: &str = "promo_discount";

/// Active checkout discount with its applied amount, scoped to one checkout
/// session (session storage).
pub const CHECKOUT_DISCOUNT: &str = "appliedDiscount";
