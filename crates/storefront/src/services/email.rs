//! Order notification emails.
//!
//! Every order produces two emails: a confirmation for the customer and a
//! new-order alert for the shop owner (with the sending mailbox on CC). Both
//! are rendered from Askama templates as HTML with a plain-text alternative
//! and sent concurrently through a [`MailTransport`].

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use chrono::Datelike;
use iconique_core::{Order, OrderId, OrderStatus, Price};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

// =============================================================================
// Templates
// =============================================================================

/// HTML template for the customer confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderView,
}

/// Plain text template for the customer confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a OrderView,
}

/// HTML template for the owner alert.
#[derive(Template)]
#[template(path = "email/new_order.html")]
struct NewOrderHtml<'a> {
    order: &'a OrderView,
}

/// Plain text template for the owner alert.
#[derive(Template)]
#[template(path = "email/new_order.txt")]
struct NewOrderText<'a> {
    order: &'a OrderView,
}

/// Order facts pre-formatted for the templates.
struct OrderView {
    store_name: String,
    order_id: String,
    customer_name: String,
    email: String,
    phone: String,
    order_date: String,
    order_date_time: String,
    status: &'static str,
    fulfillment_status: &'static str,
    items: Vec<ItemView>,
    subtotal: String,
    has_discount: bool,
    discount: String,
    shipping: String,
    total: String,
    street_line: String,
    city_line: String,
    country: String,
    payment_method: &'static str,
    collect_on_delivery: bool,
    support_email: String,
    year: i32,
}

struct ItemView {
    name: String,
    quantity: u32,
    line_total: String,
}

impl OrderView {
    fn new(order: &Order, store_name: &str, support_email: &str) -> Self {
        let customer = order.customer();
        let address = order.address();
        let date = order.order_date();

        Self {
            store_name: store_name.to_string(),
            order_id: order.order_id().to_string(),
            customer_name: customer.full_name(),
            email: customer.email.to_string(),
            phone: customer.phone.clone(),
            order_date: date.format("%B %-d, %Y").to_string(),
            order_date_time: date.format("%B %-d, %Y at %-I:%M %p UTC").to_string(),
            status: order.status().label(),
            fulfillment_status: match order.status() {
                OrderStatus::Pending => "PENDING FULFILLMENT",
                other => other.label(),
            },
            items: order
                .items()
                .iter()
                .map(|item| ItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total().map(money).unwrap_or_default(),
                })
                .collect(),
            subtotal: money(order.subtotal()),
            has_discount: order.discount() > Decimal::ZERO,
            discount: money(order.discount()),
            shipping: if order.shipping().is_zero() {
                "FREE".to_string()
            } else {
                money(order.shipping())
            },
            total: money(order.total()),
            street_line: address.street_line(),
            city_line: address.city_line(),
            country: address.country.clone(),
            payment_method: order.payment_method().label(),
            collect_on_delivery: order.payment_method().collects_on_delivery(),
            support_email: support_email.to_string(),
            year: date.year(),
        }
    }
}

fn money(amount: Decimal) -> String {
    Price::pkr(amount).to_string()
}

// =============================================================================
// Transport
// =============================================================================

/// Errors raised by a [`MailTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Any other delivery failure.
    #[error("{0}")]
    Other(String),
}

/// Something that can deliver a fully built message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: Message) -> Result<(), TransportError>;
}

/// SMTP delivery over a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        self.mailer.send(message).await?;
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Errors that can occur when building or sending one email.
#[derive(Debug, Error)]
pub enum SendError {
    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Delivery failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Who an order email is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Customer,
    Owner,
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => f.write_str("customer"),
            Self::Owner => f.write_str("owner"),
        }
    }
}

/// One email that could not be delivered.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub recipient: Recipient,
    pub address: String,
    pub error: SendError,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>: {}", self.recipient, self.address, self.error)
    }
}

/// Aggregate failure of an order notification. The order itself stands.
#[derive(Debug, Error)]
pub enum EmailDeliveryError {
    /// One or both emails failed.
    #[error("order email delivery failed: {}", describe(.0))]
    Failed(Vec<DeliveryFailure>),

    /// The two sends did not finish in time.
    #[error("order emails not delivered within {0:?}")]
    TimedOut(Duration),
}

impl EmailDeliveryError {
    /// Recipients whose email failed. Both, on timeout.
    #[must_use]
    pub fn failed_recipients(&self) -> Vec<Recipient> {
        match self {
            Self::Failed(failures) => failures.iter().map(|f| f.recipient).collect(),
            Self::TimedOut(_) => vec![Recipient::Customer, Recipient::Owner],
        }
    }
}

fn describe(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Subject, plain text and HTML of one email.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Sends the two order emails.
#[derive(Clone)]
pub struct NotificationService {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
    owner: Mailbox,
    support_address: String,
    store_name: String,
    send_timeout: Duration,
}

impl NotificationService {
    /// Create a service from configuration and a transport.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InvalidAddress`] if a configured address is not
    /// accepted by the mail library.
    pub fn new(
        config: &EmailConfig,
        store_name: impl Into<String>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, SendError> {
        let store_name = store_name.into();
        Ok(Self {
            transport,
            from: Mailbox::new(Some(store_name.clone()), address(config.from_address.as_str())?),
            owner: Mailbox::new(None, address(config.owner_address.as_str())?),
            support_address: config.support_address.to_string(),
            store_name,
            send_timeout: config.send_timeout,
        })
    }

    /// Email both parties about `order`.
    ///
    /// The two sends run concurrently and are bounded by the configured
    /// timeout. No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`EmailDeliveryError::Failed`] listing every email that could
    /// not be delivered, or [`EmailDeliveryError::TimedOut`].
    #[tracing::instrument(skip_all, fields(order_id = %order.order_id()))]
    pub async fn notify(&self, order: &Order) -> Result<OrderId, EmailDeliveryError> {
        let sends = async {
            tokio::join!(
                self.deliver(Recipient::Customer, order),
                self.deliver(Recipient::Owner, order),
            )
        };
        let (customer, owner) = tokio::time::timeout(self.send_timeout, sends)
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.send_timeout, "order emails timed out");
                EmailDeliveryError::TimedOut(self.send_timeout)
            })?;

        let failures: Vec<DeliveryFailure> = [customer, owner]
            .into_iter()
            .filter_map(Result::err)
            .collect();
        if !failures.is_empty() {
            return Err(EmailDeliveryError::Failed(failures));
        }

        tracing::info!("order emails sent");
        Ok(order.order_id().clone())
    }

    /// Render the customer confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn render_customer_email(&self, order: &Order) -> Result<RenderedEmail, SendError> {
        let view = OrderView::new(order, &self.store_name, &self.support_address);
        Ok(RenderedEmail {
            subject: format!(
                "Order Confirmation - {} (Order #{})",
                self.store_name,
                order.order_id()
            ),
            text: OrderConfirmationText { order: &view }.render()?,
            html: OrderConfirmationHtml { order: &view }.render()?,
        })
    }

    /// Render the owner alert.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn render_owner_email(&self, order: &Order) -> Result<RenderedEmail, SendError> {
        let view = OrderView::new(order, &self.store_name, &self.support_address);
        Ok(RenderedEmail {
            subject: format!(
                "New Order Received - {} (Order #{})",
                self.store_name,
                order.order_id()
            ),
            text: NewOrderText { order: &view }.render()?,
            html: NewOrderHtml { order: &view }.render()?,
        })
    }

    async fn deliver(&self, recipient: Recipient, order: &Order) -> Result<(), DeliveryFailure> {
        let to = match recipient {
            Recipient::Customer => order.customer().email.to_string(),
            Recipient::Owner => self.owner.email.to_string(),
        };

        let result = async {
            let message = self.build_message(recipient, order)?;
            self.transport.send(message).await?;
            Ok::<(), SendError>(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(%recipient, to = %to, "order email sent");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%recipient, to = %to, error = %error, "order email failed");
                Err(DeliveryFailure {
                    recipient,
                    address: to,
                    error,
                })
            }
        }
    }

    fn build_message(&self, recipient: Recipient, order: &Order) -> Result<Message, SendError> {
        let (email, to) = match recipient {
            Recipient::Customer => {
                let customer = order.customer();
                let to = Mailbox::new(Some(customer.full_name()), address(customer.email.as_str())?);
                (self.render_customer_email(order)?, to)
            }
            Recipient::Owner => (self.render_owner_email(order)?, self.owner.clone()),
        };

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject);
        if recipient == Recipient::Owner {
            builder = builder.cc(Mailbox::new(None, self.from.email.clone()));
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html),
                ),
        )?;
        Ok(message)
    }
}

fn address(raw: &str) -> Result<Address, SendError> {
    raw.parse()
        .map_err(|_| SendError::InvalidAddress(raw.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use iconique_core::{Cart, Email, LineItem, ShippingForm, pricing};
    use secrecy::SecretString;

    use super::*;

    /// Records delivered messages; fails for any address listed in `fail_for`.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Message>>,
        fail_for: Vec<String>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: Message) -> Result<(), TransportError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let to = message.envelope().to()[0].to_string();
            if self.fail_for.contains(&to) {
                return Err(TransportError::Other(format!("mailbox {to} unavailable")));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "orders@theiconique.pk".to_string(),
            smtp_password: SecretString::from("app-password"),
            from_address: Email::parse("orders@theiconique.pk").unwrap(),
            owner_address: Email::parse("owner@theiconique.pk").unwrap(),
            support_address: Email::parse("care@theiconique.pk").unwrap(),
            send_timeout: Duration::from_millis(200),
        }
    }

    fn order(discount_percent: Option<i64>) -> Order {
        let form = ShippingForm {
            first_name: "Zara".to_string(),
            last_name: "Ahmed".to_string(),
            phone: "+92 321 0000000".to_string(),
            email: "zara@example.com".to_string(),
            country: "Pakistan".to_string(),
            city: "Lahore".to_string(),
            address: "45 Gulberg III".to_string(),
            apartment: "Flat 2B".to_string(),
            postal_code: "54660".to_string(),
            accept_terms: true,
        };
        let (customer, address) = form.validate().unwrap();
        let mut cart = Cart::new();
        cart.add(LineItem::new("p1", "Matte Lipstick <Rose>", Decimal::from(1000), ""), 2);
        cart.add(LineItem::new("p2", "Kohl Liner", Decimal::from(500), ""), 1);
        let rate = discount_percent
            .map(|p| iconique_core::DiscountRate::new(Decimal::new(p, 2)).unwrap());
        let summary = pricing::summarize(&cart, rate);
        Order::build(
            OrderId::new("ORD-1741948200000-Q7W2E9R4T"),
            customer,
            address,
            &cart,
            &summary,
            Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap(),
        )
    }

    fn service(transport: Arc<RecordingTransport>) -> NotificationService {
        NotificationService::new(&config(), "The Iconique", transport).unwrap()
    }

    #[test]
    fn test_customer_email_content() {
        let service = service(Arc::new(RecordingTransport::default()));
        let email = service.render_customer_email(&order(Some(20))).unwrap();

        assert_eq!(
            email.subject,
            "Order Confirmation - The Iconique (Order #ORD-1741948200000-Q7W2E9R4T)"
        );
        assert!(email.html.contains("Zara Ahmed"));
        assert!(email.html.contains("March 14, 2025"));
        assert!(email.html.contains("PENDING"));
        assert!(email.html.contains("Rs. 2000.00"));
        assert!(email.html.contains("-Rs. 500.00"));
        assert!(email.html.contains("Rs. 2250.00"));
        assert!(email.html.contains("45 Gulberg III, Flat 2B"));
        assert!(email.html.contains("Lahore, 54660"));
        assert!(email.html.contains("Cash on Delivery"));
        assert!(email.html.contains("care@theiconique.pk"));
        // product names are escaped in HTML
        assert!(!email.html.contains("<Rose>"));
        assert!(email.html.contains("Matte Lipstick &"));

        assert!(email.text.contains("Order ID: ORD-1741948200000-Q7W2E9R4T"));
        assert!(email.text.contains("Matte Lipstick <Rose>"));
        assert!(email.text.contains("Total: Rs. 2250.00"));
    }

    #[test]
    fn test_discount_row_only_when_discounted() {
        let service = service(Arc::new(RecordingTransport::default()));
        let email = service.render_customer_email(&order(None)).unwrap();
        assert!(!email.html.contains("Discount"));
        assert!(!email.text.contains("Discount"));
    }

    #[test]
    fn test_owner_email_content() {
        let service = service(Arc::new(RecordingTransport::default()));
        let email = service.render_owner_email(&order(Some(50))).unwrap();

        assert_eq!(
            email.subject,
            "New Order Received - The Iconique (Order #ORD-1741948200000-Q7W2E9R4T)"
        );
        assert!(email.html.contains("PENDING FULFILLMENT"));
        assert!(email.html.contains("10:30 AM"));
        assert!(email.html.contains("zara@example.com"));
        assert!(email.html.contains("+92 321 0000000"));
        assert!(email.html.contains("Amount to Collect"));
        // 2500 - 50% = 1250 + 250 shipping
        assert!(email.text.contains("Amount to Collect: Rs. 1500.00"));
    }

    #[test]
    fn test_free_shipping_shows_free() {
        let service = service(Arc::new(RecordingTransport::default()));
        let mut json = serde_json::to_value(order(None)).unwrap();
        json["subtotal"] = serde_json::json!("3500");
        json["shipping"] = serde_json::json!("0");
        json["total"] = serde_json::json!("3500");
        let free: Order = serde_json::from_value(json).unwrap();

        let email = service.render_customer_email(&free).unwrap();
        assert!(email.text.contains("Shipping: FREE"));
    }

    #[tokio::test]
    async fn test_notify_sends_both_with_owner_cc() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(Arc::clone(&transport));

        let id = service.notify(&order(None)).await.unwrap();
        assert_eq!(id.as_str(), "ORD-1741948200000-Q7W2E9R4T");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);

        let customer = sent
            .iter()
            .find(|m| m.envelope().to().len() == 1)
            .unwrap();
        assert_eq!(customer.envelope().to()[0].to_string(), "zara@example.com");

        // owner alert goes to the owner and CCs the sender
        let owner = sent
            .iter()
            .find(|m| m.envelope().to().len() == 2)
            .unwrap();
        let owner_rcpts: Vec<String> = owner.envelope().to().iter().map(ToString::to_string).collect();
        assert!(owner_rcpts.contains(&"owner@theiconique.pk".to_string()));
        assert!(owner_rcpts.contains(&"orders@theiconique.pk".to_string()));
        assert_eq!(
            owner.envelope().from().unwrap().to_string(),
            "orders@theiconique.pk"
        );
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_notification() {
        let transport = Arc::new(RecordingTransport {
            fail_for: vec!["owner@theiconique.pk".to_string()],
            ..RecordingTransport::default()
        });
        let service = service(Arc::clone(&transport));

        let err = service.notify(&order(None)).await.unwrap_err();
        assert_eq!(err.failed_recipients(), vec![Recipient::Owner]);
        assert!(err.to_string().contains("owner <owner@theiconique.pk>"));
        // the customer email still went out
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_transport_times_out() {
        let transport = Arc::new(RecordingTransport {
            delay: Some(Duration::from_secs(5)),
            ..RecordingTransport::default()
        });
        let service = service(transport);

        let err = service.notify(&order(None)).await.unwrap_err();
        assert!(matches!(err, EmailDeliveryError::TimedOut(_)));
        assert_eq!(err.failed_recipients().len(), 2);
    }
}
