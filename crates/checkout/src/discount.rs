//! Storage-backed holders for the active promo code.
//!
//! The cart page and the checkout page each keep their own slot, with their
//! own code table and storage location. Applying a code to one never affects
//! the other.

use std::sync::Arc;

use iconique_core::{AppliedDiscount, PromoError, PromoTable};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::keys;
use crate::storage::{Storage, StorageError, StorageExt};

/// Errors from applying a promo code to a slot.
#[derive(Debug, Error)]
pub enum DiscountError {
    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Holds at most one active discount.
pub struct DiscountSlot {
    storage: Arc<dyn Storage>,
    key: &'static str,
    table: PromoTable,
}

impl DiscountSlot {
    /// Create a slot over any table and key.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, key: &'static str, table: PromoTable) -> Self {
        Self {
            storage,
            key,
            table,
        }
    }

    /// The cart page's slot, kept in local storage.
    #[must_use]
    pub fn cart_page(local: Arc<dyn Storage>) -> Self {
        Self::new(local, keys::CART_PROMO, PromoTable::cart_page())
    }

    /// The checkout page's slot, kept in session storage.
    #[must_use]
    pub fn checkout(session: Arc<dyn Storage>) -> Self {
        Self::new(session, keys::CHECKOUT_DISCOUNT, PromoTable::checkout())
    }

    /// Look up `input` and make it the active discount, replacing any
    /// previous one. The stored record snapshots the discount on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::Promo`] for a blank or unknown code and
    /// [`DiscountError::Storage`] if the slot cannot be written. In both
    /// cases the previously active discount stays in effect.
    pub fn apply(&self, input: &str, subtotal: Decimal) -> Result<AppliedDiscount, DiscountError> {
        let applied = self.table.lookup(input, subtotal)?;
        self.storage.set_json(self.key, &applied)?;
        tracing::info!(
            code = %applied.code,
            percent = %applied.rate.percent(),
            amount = %applied.amount,
            "promo code applied"
        );
        Ok(applied)
    }

    /// The active discount, if any.
    ///
    /// An unreadable record counts as no discount.
    #[must_use]
    pub fn active(&self) -> Option<AppliedDiscount> {
        match self.storage.get_json::<AppliedDiscount>(self.key) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "ignoring unreadable discount record");
                None
            }
        }
    }

    /// Drop the active discount.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(self.key)
    }

    /// Confirmation line for a discount applied through this slot.
    #[must_use]
    pub fn confirmation(&self, applied: &AppliedDiscount) -> String {
        self.table.confirmation(applied)
    }
}

impl std::fmt::Debug for DiscountSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountSlot")
            .field("key", &self.key)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
