//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//! Every error body has the same JSON shape as a successful
//! [`OrderEmailResponse`], with `success: false`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use iconique_core::{OrderEmailResponse, OrderPayloadError};
use thiserror::Error;

use crate::services::email::EmailDeliveryError;

/// Application-level error type for the notification service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body could not be parsed.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Order payload is missing information the emails need.
    #[error("Missing required order information: {0}")]
    MissingOrderInfo(#[from] OrderPayloadError),

    /// One or both emails could not be delivered.
    #[error("Email delivery failed: {0}")]
    EmailDelivery(#[from] EmailDeliveryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::MissingOrderInfo(_) => StatusCode::BAD_REQUEST,
            Self::EmailDelivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::EmailDelivery(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::EmailDelivery(_) => "Failed to send order emails".to_string(),
            Self::Internal(_) => "Server error occurred".to_string(),
            Self::InvalidBody(_) | Self::MissingOrderInfo(_) => self.to_string(),
        };

        (self.status(), Json(OrderEmailResponse::failure(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
