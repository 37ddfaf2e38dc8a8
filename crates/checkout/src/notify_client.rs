//! Client for the order notification endpoint.
//!
//! Called after an order has been committed locally. A failure here never
//! affects the order; the caller logs it and moves on.

use std::time::Duration;

use iconique_core::{Order, OrderEmailResponse};
use thiserror::Error;
use url::Url;

/// Path of the notification endpoint, relative to the service base URL.
const SEND_ORDER_EMAILS_PATH: &str = "api/send-order-emails";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Errors that can occur when asking the service to send order emails.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The configured base URL is unusable.
    #[error("invalid notification service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but did not send the emails.
    #[error("notification rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// HTTP client for `POST /api/send-order-emails`.
#[derive(Debug, Clone)]
pub struct OrderNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl OrderNotifier {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL does not parse or the HTTP client fails to
    /// build.
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(SEND_ORDER_EMAILS_PATH)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the service to email the customer and the shop owner.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the service is unreachable and
    /// [`NotifyError::Rejected`] if it answers with a failure.
    #[tracing::instrument(skip_all, fields(order_id = %order.order_id()))]
    pub async fn send(&self, order: &Order) -> Result<OrderEmailResponse, NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(order)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<OrderEmailResponse>(&text) {
            Ok(body) if status.is_success() && body.success => {
                tracing::info!("order emails sent");
                Ok(body)
            }
            Ok(body) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: body.message,
            }),
            Err(_) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: text,
            }),
        }
    }
}
