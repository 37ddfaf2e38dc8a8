//! Append-only list of placed orders.

use std::sync::Arc;

use iconique_core::Order;

use crate::keys;
use crate::storage::{Storage, StorageError, StorageExt};

/// The persisted orders record under [`keys::ORDERS`].
pub struct OrderLog {
    storage: Arc<dyn Storage>,
}

impl OrderLog {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Append an order to the end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the existing record cannot be
    /// read (it is never overwritten), or any write error.
    pub fn append(&self, order: &Order) -> Result<usize, StorageError> {
        let mut orders = self.list()?;
        orders.push(order.clone());
        self.storage.set_json(keys::ORDERS, &orders)?;
        Ok(orders.len())
    }

    /// All orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unreadable.
    pub fn list(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self
            .storage
            .get_json::<Vec<Order>>(keys::ORDERS)?
            .unwrap_or_default())
    }

    /// Number of orders placed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unreadable.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.list().map(|orders| orders.len())
    }

    /// Whether no order has been placed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unreadable.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.len().map(|len| len == 0)
    }
}

impl std::fmt::Debug for OrderLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use iconique_core::{Cart, LineItem, OrderId, ShippingForm, pricing};
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::MemoryStorage;

    fn order(id: &str) -> Order {
        let form = ShippingForm {
            first_name: "Sara".to_string(),
            last_name: "Malik".to_string(),
            phone: "03001234567".to_string(),
            email: "sara@example.com".to_string(),
            country: "Pakistan".to_string(),
            city: "Karachi".to_string(),
            address: "House 4, Street 9".to_string(),
            accept_terms: true,
            ..ShippingForm::default()
        };
        let (customer, address) = form.validate().unwrap();
        let mut cart = Cart::new();
        cart.add(LineItem::new("p1", "Blush", Decimal::from(900), ""), 1);
        let summary = pricing::summarize(&cart, None);
        Order::build(OrderId::new(id), customer, address, &cart, &summary, Utc::now())
    }

    #[test]
    fn test_append_keeps_order() {
        let log = OrderLog::new(Arc::new(MemoryStorage::new()));
        assert!(log.is_empty().unwrap());

        assert_eq!(log.append(&order("ORD-1-A")).unwrap(), 1);
        assert_eq!(log.append(&order("ORD-2-B")).unwrap(), 2);

        let orders = log.list().unwrap();
        assert_eq!(orders[0].order_id().as_str(), "ORD-1-A");
        assert_eq!(orders[1].order_id().as_str(), "ORD-2-B");
    }

    #[test]
    fn test_corrupt_record_is_never_overwritten() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::ORDERS, "not json").unwrap();
        let log = OrderLog::new(Arc::clone(&storage));

        let err = log.append(&order("ORD-1-A")).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
        assert_eq!(storage.get(keys::ORDERS).unwrap().as_deref(), Some("not json"));
    }
}
