//! Iconique Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Iconique components:
//! - `checkout` - Client-side cart store, discount slots and order builder
//! - `storefront` - Order notification service and HTTP API
//! - `cli` - Command-line driver for the cart and checkout flow
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`cart`] - Line items and the ordered cart they live in
//! - [`pricing`] - Subtotal, discount, shipping and total computation
//! - [`promo`] - Promo code tables and the active discount descriptor
//! - [`order`] - Shipping form validation and the immutable order record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod pricing;
pub mod promo;
pub mod types;

pub use cart::{Cart, LineItem, LineRef};
pub use order::{
    Address, Customer, NamePart, Order, OrderEmailResponse, OrderPayloadError, ShippingForm,
    ValidationError,
};
pub use pricing::{PricingPolicy, PricingSummary};
pub use promo::{AppliedDiscount, CodeKind, DiscountRate, PromoError, PromoTable};
pub use types::*;
