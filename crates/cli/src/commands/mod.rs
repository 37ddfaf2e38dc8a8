//! CLI command implementations.
//!
//! - `cart` - cart inspection and mutations
//! - `promo` - the cart page promo code
//! - `checkout` - order placement and email notification
//! - `orders` - the placed orders list

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod promo;

use std::path::Path;
use std::sync::Arc;

use iconique_checkout::{
    CartStore, CheckoutError, DiscountError, DiscountSlot, JsonFileStorage, MemoryStorage,
    OrderLog, Storage, StorageError,
};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Discount(#[from] DiscountError),

    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    #[error("no cart line matches {0}")]
    NoSuchLine(String),

    #[error("cart total would be too large to price")]
    TotalTooLarge,
}

/// The storages and stores of one CLI invocation.
pub struct Context {
    local: Arc<dyn Storage>,
    session: Arc<dyn Storage>,
    cart: Arc<CartStore>,
}

impl Context {
    /// Open the persisted records in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let local: Arc<dyn Storage> = Arc::new(JsonFileStorage::open(data_dir)?);
        let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let cart = Arc::new(CartStore::open(Arc::clone(&local)));
        Ok(Self {
            local,
            session,
            cart,
        })
    }

    /// The persisted cart.
    #[must_use]
    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    /// The cart page promo slot.
    #[must_use]
    pub fn cart_promo(&self) -> DiscountSlot {
        DiscountSlot::cart_page(Arc::clone(&self.local))
    }

    /// The checkout discount slot, scoped to this invocation.
    #[must_use]
    pub fn checkout_discount(&self) -> DiscountSlot {
        DiscountSlot::checkout(Arc::clone(&self.session))
    }

    /// The placed orders list.
    #[must_use]
    pub fn orders(&self) -> OrderLog {
        OrderLog::new(Arc::clone(&self.local))
    }
}
