//! Order notification route.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use iconique_core::{Order, OrderEmailResponse};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Send the order confirmation and the owner alert for a placed order.
///
/// The order has already been recorded by the client; this only delivers
/// the two emails. Responds 400 when the payload is unusable and 500 when
/// either email could not be sent.
#[instrument(skip_all, fields(request_id = %request_id))]
pub async fn send_order_emails(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: std::result::Result<Json<Order>, JsonRejection>,
) -> Result<Json<OrderEmailResponse>> {
    let Json(order) = payload.map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;
    order.ensure_notifiable()?;

    tracing::info!(
        order_id = %order.order_id(),
        items = order.items().len(),
        total = %order.total(),
        "sending order emails"
    );

    let order_id = state.notifications().notify(&order).await?;
    Ok(Json(OrderEmailResponse::sent(order_id)))
}
