//! HTTP route handlers for the order notification service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/health             - Liveness check with service name and time
//! POST /api/send-order-emails  - Email the customer and the shop owner
//! ```

pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/send-order-emails", post(orders::send_order_emails))
}

/// Create the full application router (without middleware).
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
