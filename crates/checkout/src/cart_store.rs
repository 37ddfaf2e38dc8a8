//! The persisted cart of one browsing context.
//!
//! A [`CartStore`] owns the cart for its context. Every mutation computes the
//! next cart, writes it to storage, and only then publishes the new snapshot
//! on a `watch` channel. Other contexts sharing the same storage are picked
//! up through the storage change channel (see
//! [`CartStore::spawn_storage_listener`]).
//!
//! Several contexts writing the same storage follow last-writer-wins; there
//! is no cross-context locking.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use iconique_core::{Cart, DiscountRate, LineItem, LineRef, PricingPolicy, PricingSummary};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::keys;
use crate::storage::{Storage, StorageError, StorageExt};

/// Cart state for one browsing context, persisted under [`keys::CART`].
pub struct CartStore {
    storage: Arc<dyn Storage>,
    state: watch::Sender<Cart>,
    policy: PricingPolicy,
    write_lock: Mutex<()>,
}

impl CartStore {
    /// Load the persisted cart.
    ///
    /// A missing, unreadable or corrupt record yields an empty cart; the
    /// failure is logged rather than returned.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let cart = load(storage.as_ref());
        Self {
            storage,
            state: watch::Sender::new(cart),
            policy: PricingPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use a non-default shipping policy for [`CartStore::summary`].
    #[must_use]
    pub const fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add `quantity` units of `item` (0 counts as 1), merging by id.
    ///
    /// Returns `false`, changing nothing, if the cart subtotal would become
    /// too large to represent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted; the cart is then
    /// left unchanged.
    pub fn add(&self, item: LineItem, quantity: u32) -> Result<bool, StorageError> {
        self.mutate(|cart| cart.add(item, quantity))
    }

    /// Remove a line. Returns `false` (and changes nothing) if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(&self, line: &LineRef) -> Result<bool, StorageError> {
        self.mutate(|cart| cart.remove(line).is_some())
    }

    /// Set a line's quantity, clamped to at least 1.
    ///
    /// Returns `false` if the line is missing or the subtotal would become
    /// too large to represent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn set_quantity(&self, line: &LineRef, quantity: i64) -> Result<bool, StorageError> {
        self.mutate(|cart| cart.set_quantity(line, quantity))
    }

    /// Add one unit to a line. Returns `false` if the line is missing or the
    /// subtotal would become too large to represent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn increment(&self, line: &LineRef) -> Result<bool, StorageError> {
        self.mutate(|cart| cart.increment(line))
    }

    /// Take one unit off a line, never going below 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn decrement(&self, line: &LineRef) -> Result<bool, StorageError> {
        self.mutate(|cart| cart.decrement(line))
    }

    /// Replace the whole cart with a single line ("buy now").
    ///
    /// Returns `false`, keeping the current cart, if the line alone is too
    /// large to price.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn replace_with(&self, item: LineItem, quantity: u32) -> Result<bool, StorageError> {
        self.mutate(|cart| {
            let mut single = Cart::new();
            let fits = single.add(item, quantity);
            if fits {
                *cart = single;
            }
            fits
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.mutate(Cart::clear)
    }

    /// Current cart contents.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Sum of quantities, shown on the header badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.borrow().total_quantity()
    }

    /// Price the current cart under an optional discount.
    #[must_use]
    pub fn summary(&self, discount: Option<DiscountRate>) -> PricingSummary {
        self.policy.summarize(&self.state.borrow(), discount)
    }

    /// Shipping policy used by [`CartStore::summary`].
    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Receive a fresh snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Re-read the persisted cart and publish it if it differs from the
    /// current snapshot. Returns whether anything changed.
    ///
    /// Safe to call any number of times for the same storage state.
    pub fn sync_from_storage(&self) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let persisted = load(self.storage.as_ref());
        self.state.send_if_modified(|current| {
            if *current == persisted {
                false
            } else {
                *current = persisted;
                true
            }
        })
    }

    /// Follow cart writes made by other contexts sharing this storage.
    ///
    /// The task holds only a weak reference and exits once the store is
    /// dropped or the storage channel closes.
    pub fn spawn_storage_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.storage.subscribe();
        let store: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let relevant = match events.recv().await {
                    Ok(event) => event.key == keys::CART,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "cart listener lagged, resyncing");
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !relevant {
                    continue;
                }
                let Some(store) = store.upgrade() else {
                    break;
                };
                if store.sync_from_storage() {
                    tracing::debug!(
                        items = store.item_count(),
                        "cart updated from another context"
                    );
                }
            }
        })
    }

    /// Apply `f` to a copy of the cart, persist the result, then publish it.
    ///
    /// Nothing is written or published when `f` leaves the cart unchanged.
    fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> Result<R, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = self.state.borrow().clone();
        let outcome = f(&mut next);
        if *self.state.borrow() == next {
            return Ok(outcome);
        }

        self.storage.set_json(keys::CART, &next)?;
        self.state.send_replace(next);
        Ok(outcome)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.state.borrow())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn load(storage: &dyn Storage) -> Cart {
    match storage.get_json::<Cart>(keys::CART) {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "could not load persisted cart, starting empty");
            Cart::new()
        }
    }
}
