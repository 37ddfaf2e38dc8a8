//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::email::{MailTransport, NotificationService, SendError, SmtpMailer};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("notification service error: {0}")]
    Notifications(#[from] SendError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    notifications: NotificationService,
}

impl AppState {
    /// Create the state with an SMTP transport built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay or a mail address is invalid.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let mailer = SmtpMailer::new(&config.email)?;
        Self::with_transport(config, Arc::new(mailer))
    }

    /// Create the state with any mail transport.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured mail address is invalid.
    pub fn with_transport(
        config: StorefrontConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, StateError> {
        let notifications =
            NotificationService::new(&config.email, config.store_name.clone(), transport)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                notifications,
            }),
        })
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order notification service.
    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.inner.notifications
    }
}
