//! Shared fixtures for The Iconique integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p iconique-integration-tests
//! ```
//!
//! Everything runs in-process: storage is in memory or in a temporary
//! directory, and the email service uses a [`RecordingTransport`] instead of
//! an SMTP relay.
//!
//! # Test Categories
//!
//! - `checkout_flow` - cart, discount and order placement across contexts
//! - `order_emails_api` - the HTTP notification endpoints

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use iconique_core::{LineItem, ShippingForm};
use iconique_storefront::config::StorefrontConfig;
use iconique_storefront::services::email::{MailTransport, TransportError};
use iconique_storefront::state::AppState;
use lettre::Message;
use rust_decimal::Decimal;

/// Owner mailbox used by [`test_config`].
pub const OWNER_EMAIL: &str = "owner@theiconique.pk";

/// Sending mailbox used by [`test_config`].
pub const FROM_EMAIL: &str = "orders@theiconique.pk";

/// Mail transport that keeps messages instead of sending them.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Message>>,
    fail_for: Vec<String>,
}

impl RecordingTransport {
    /// A transport that rejects every message whose first recipient is
    /// `address`.
    #[must_use]
    pub fn failing_for(address: &str) -> Self {
        Self {
            sent: Mutex::default(),
            fail_for: vec![address.to_string()],
        }
    }

    /// First recipient of every delivered message.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|message| message.envelope().to().first().map(ToString::to_string))
            .collect()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let to = message
            .envelope()
            .to()
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();
        if self.fail_for.contains(&to) {
            return Err(TransportError::Other(format!("mailbox {to} unavailable")));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

/// Service configuration pointing at nothing real.
///
/// # Panics
///
/// Panics if the fixed test values stop being valid configuration.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_config() -> StorefrontConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SMTP_HOST", "smtp.example.com"),
        ("SMTP_USERNAME", FROM_EMAIL),
        ("SMTP_PASSWORD", "qwpe zmxn ruty alsk"),
        ("OWNER_EMAIL", OWNER_EMAIL),
        ("SUPPORT_EMAIL", "care@theiconique.pk"),
        ("MAIL_SEND_TIMEOUT_SECS", "5"),
    ]);
    StorefrontConfig::from_lookup(|key| vars.get(key).map(ToString::to_string))
        .expect("test configuration is valid")
}

/// Application state backed by `transport`.
///
/// # Panics
///
/// Panics if the test configuration is rejected.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_state(transport: std::sync::Arc<RecordingTransport>) -> AppState {
    AppState::with_transport(test_config(), transport).expect("state builds")
}

/// A shipping form that passes validation.
#[must_use]
pub fn valid_form() -> ShippingForm {
    ShippingForm {
        first_name: "Zara".to_string(),
        last_name: "Ahmed".to_string(),
        phone: "+92 321 0000000".to_string(),
        email: "zara@example.com".to_string(),
        country: "Pakistan".to_string(),
        city: "Lahore".to_string(),
        address: "45 Gulberg III".to_string(),
        apartment: String::new(),
        postal_code: "54660".to_string(),
        accept_terms: true,
    }
}

/// A lipstick at Rs. 1000.
#[must_use]
pub fn lipstick() -> LineItem {
    LineItem::new(
        "lip-01",
        "Velvet Matte Lipstick",
        Decimal::from(1000),
        "images/lip-01.jpg",
    )
}

/// A kohl liner at Rs. 500.
#[must_use]
pub fn liner() -> LineItem {
    LineItem::new("kohl-02", "Kohl Liner", Decimal::from(500), "images/kohl-02.jpg")
}
