//! Cart to order, across storage backends and browsing contexts.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use iconique_checkout::{
    CartStore, CheckoutError, DiscountSlot, JsonFileStorage, MemoryStorage, OrderBuilder,
    OrderLog, Storage,
};
use iconique_core::{OrderStatus, PaymentMethod, ValidationError};
use iconique_integration_tests::{lipstick, liner, valid_form};
use rust_decimal::Decimal;

fn builder(storage: &Arc<dyn Storage>) -> (Arc<CartStore>, OrderBuilder) {
    let cart = Arc::new(CartStore::open(Arc::clone(storage)));
    let builder = OrderBuilder::new(Arc::clone(&cart), OrderLog::new(Arc::clone(storage)));
    (cart, builder)
}

#[test]
fn test_discounted_order_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let local: Arc<dyn Storage> = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
    let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

    let (cart, builder) = builder(&local);
    cart.add(lipstick(), 2).unwrap();
    cart.add(liner(), 1).unwrap();

    let slot = DiscountSlot::checkout(Arc::clone(&session));
    let applied = slot.apply("welcome20", cart.snapshot().subtotal()).unwrap();
    assert_eq!(applied.amount, Decimal::from(500));
    let builder = builder.with_discount_slot(DiscountSlot::checkout(Arc::clone(&session)));

    let order = builder.place_order(&valid_form(), Some(&applied)).unwrap();
    assert_eq!(order.subtotal(), Decimal::from(2500));
    assert_eq!(order.discount(), Decimal::from(500));
    assert_eq!(order.shipping(), Decimal::from(250));
    assert_eq!(order.total(), Decimal::from(2250));
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.payment_method(), PaymentMethod::CashOnDelivery);
    assert!(order.ensure_notifiable().is_ok());

    assert!(cart.snapshot().is_empty());
    assert!(slot.active().is_none());

    // A new process sees an empty cart and the placed order.
    let reopened: Arc<dyn Storage> = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
    assert!(CartStore::open(Arc::clone(&reopened)).snapshot().is_empty());
    let orders = OrderLog::new(reopened).list().unwrap();
    assert_eq!(orders, vec![order]);
}

#[test]
fn test_free_shipping_from_threshold() {
    let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let (cart, builder) = builder(&local);
    cart.add(lipstick(), 3).unwrap();
    cart.add(liner(), 1).unwrap();

    let order = builder.place_order(&valid_form(), None).unwrap();
    assert_eq!(order.subtotal(), Decimal::from(3500));
    assert_eq!(order.shipping(), Decimal::ZERO);
    assert_eq!(order.total(), Decimal::from(3500));
}

#[test]
fn test_rejected_checkout_changes_nothing() {
    let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let (cart, builder) = builder(&local);

    let err = builder.place_order(&valid_form(), None).unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(
        err.to_string(),
        "Your cart is empty. Please add items before checkout"
    );

    cart.add(lipstick(), 1).unwrap();
    let mut form = valid_form();
    form.accept_terms = false;
    let err = builder.place_order(&form, None).unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::TermsNotAccepted)
    ));

    assert_eq!(cart.item_count(), 1);
    assert!(builder.orders().is_empty().unwrap());
}

#[tokio::test]
async fn test_other_context_sees_cart_cleared_by_checkout() {
    let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let (cart, builder) = builder(&local);
    let other_tab = Arc::new(CartStore::open(Arc::clone(&local)));
    let _listener = other_tab.spawn_storage_listener();

    let mut changes = other_tab.subscribe();
    cart.add(lipstick(), 1).unwrap();
    tokio::time::timeout(Duration::from_secs(1), changes.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other_tab.item_count(), 1);

    builder.place_order(&valid_form(), None).unwrap();
    tokio::time::timeout(Duration::from_secs(1), changes.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(other_tab.snapshot().is_empty());
    assert_eq!(OrderLog::new(local).len().unwrap(), 1);
}

#[test]
fn test_discount_is_repriced_when_cart_changes_after_applying() {
    let local: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let (cart, builder) = builder(&local);
    cart.add(lipstick(), 2).unwrap();

    let slot = DiscountSlot::checkout(Arc::clone(&session));
    slot.apply("SAVE10", cart.snapshot().subtotal()).unwrap();
    cart.add(liner(), 2).unwrap();

    let applied = slot.active().unwrap();
    assert_eq!(applied.amount, Decimal::from(200));

    let order = builder.place_order(&valid_form(), Some(&applied)).unwrap();
    assert_eq!(order.subtotal(), Decimal::from(3000));
    assert_eq!(order.discount(), Decimal::from(300));
    assert_eq!(order.shipping(), Decimal::from(250));
    assert_eq!(order.total(), Decimal::from(2950));
}
