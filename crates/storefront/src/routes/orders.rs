//! Order history route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use wavecrest_core::format_amount;

use crate::docstore::OrderStore as _;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderSummaryView {
    pub order_id: String,
    pub status: String,
    pub total: String,
    pub payment_method: String,
    pub item_count: usize,
    pub created_at: String,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            status: order.status.to_string(),
            total: format_amount(order.total),
            payment_method: order.payment_method.label().to_owned(),
            item_count: order.items.len(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Order history for the signed-in identity, newest first.
#[instrument(skip(state), fields(identity = %identity.id))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.docstore().orders_for_owner(&identity.id).await?;
    let views: Vec<OrderSummaryView> = orders.iter().map(OrderSummaryView::from).collect();
    Ok(Json(views))
}
