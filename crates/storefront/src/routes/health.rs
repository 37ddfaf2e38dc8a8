//! Health check route.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

/// Liveness health check.
///
/// Does not touch the mail server.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running",
        service: format!("{} Order Email Service", state.config().store_name),
        timestamp: Utc::now(),
    })
}
