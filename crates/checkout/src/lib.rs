//! Iconique Checkout - client-side cart and order pipeline.
//!
//! Everything a browsing context needs between "add to cart" and "order
//! placed":
//!
//! - [`storage`] - key/value storage backends with a change channel
//! - [`cart_store`] - the persisted cart and its change notifications
//! - [`discount`] - storage-backed slots holding the active promo code
//! - [`order_log`] - the append-only list of placed orders
//! - [`order_builder`] - turns a cart and a shipping form into an order
//! - [`notify_client`] - HTTP client for the order email endpoint
//!
//! Pricing and validation rules live in `iconique-core`; this crate only wires
//! them to storage.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_store;
pub mod discount;
pub mod keys;
pub mod notify_client;
pub mod order_builder;
pub mod order_log;
pub mod storage;

pub use cart_store::CartStore;
pub use discount::{DiscountError, DiscountSlot};
pub use notify_client::{NotifyError, OrderNotifier};
pub use order_builder::{CheckoutError, OrderBuilder};
pub use order_log::OrderLog;
pub use storage::{JsonFileStorage, MemoryStorage, Storage, StorageError, StorageEvent, StorageExt};
