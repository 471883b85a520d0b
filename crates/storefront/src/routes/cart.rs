//! Cart route handlers.
//!
//! Mutations require a signed-in identity; an unauthenticated browser request
//! is redirected to login with the attempted path preserved, so the add can
//! be retried after signing in. Guests get an empty read-only view.

use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wavecrest_core::{ProductId, format_amount};

use crate::cart::{CartContents, NewLineItem};
use crate::error::AppError;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub title: String,
    pub image_ref: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: format_amount(Decimal::ZERO),
            item_count: 0,
        }
    }
}

impl From<CartContents> for CartView {
    fn from(contents: CartContents) -> Self {
        Self {
            items: contents
                .items
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.as_str().to_owned(),
                    title: item.title.clone(),
                    image_ref: item.image_ref.clone(),
                    quantity: item.quantity,
                    unit_price: format_amount(item.unit_price),
                    line_total: format_amount(item.line_total()),
                })
                .collect(),
            subtotal: format_amount(contents.subtotal),
            item_count: contents.item_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub image_ref: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: String,
}

/// Show the cart. Guests see an empty cart.
#[instrument(skip(state, auth))]
pub async fn show(State(state): State<AppState>, auth: OptionalAuth) -> impl IntoResponse {
    let OptionalAuth(identity) = auth;
    let view = match identity {
        Some(identity) => CartView::from(state.carts().view(&identity.id).await),
        None => CartView::empty(),
    };
    Json(view)
}

/// Add a product to the cart. Adding a product already present accumulates
/// its quantity.
#[instrument(skip(state, request), fields(identity = %identity.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item = NewLineItem {
        product_id: ProductId::new(request.product_id),
        title: request.title,
        image_ref: request.image_ref,
        unit_price: request.unit_price,
        description: request.description,
    };

    let contents = state
        .carts()
        .add_item(&identity.id, item, request.quantity)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(CartView::from(contents)))
}

/// Remove a product from the cart. Removing an absent product is a no-op.
#[instrument(skip(state, request), fields(identity = %identity.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(request): Json<RemoveFromCartRequest>,
) -> impl IntoResponse {
    let contents = state
        .carts()
        .remove_item(&identity.id, &ProductId::new(request.product_id))
        .await;
    Json(CartView::from(contents))
}

/// Empty the cart.
#[instrument(skip(state), fields(identity = %identity.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> impl IntoResponse {
    let contents = state.carts().clear(&identity.id).await;
    Json(CartView::from(contents))
}

/// Item count for the cart badge.
#[instrument(skip(state, auth))]
pub async fn count(State(state): State<AppState>, auth: OptionalAuth) -> impl IntoResponse {
    let OptionalAuth(identity) = auth;
    let item_count = match identity {
        Some(identity) => state.carts().view(&identity.id).await.item_count,
        None => 0,
    };
    Json(serde_json::json!({ "item_count": item_count }))
}
