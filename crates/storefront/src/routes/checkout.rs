//! Checkout route handlers.
//!
//! Two payment paths converge on the same order placement:
//!
//! - card: one POST confirms the mock charge and places the order;
//! - GCash: `create` starts the provider redirect and parks the handle in
//!   the session, `capture` finishes it after the buyer approves, `cancel`
//!   abandons it with the cart untouched.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument};

use wavecrest_core::format_amount;

use crate::checkout::{CheckoutError, CheckoutForm};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Order, PendingRedirectCheckout, session_keys};
use crate::payments::ConfirmedPayment;
use crate::routes::cart::CartView;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutEntry {
    pub form: CheckoutForm,
    pub cart: CartView,
}

#[derive(Debug, Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub status: String,
    pub total: String,
    pub payment_method: String,
    /// The provider's reference for the confirmed payment: the mock
    /// endpoint's payment ID for card, the capture transaction ID for GCash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
}

impl From<&Order> for OrderPlacedResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            status: order.status.to_string(),
            total: format_amount(order.total),
            payment_method: order.payment_method.label().to_owned(),
            payment_ref: order.payment_transaction_ref.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    #[serde(flatten)]
    pub shipping: CheckoutForm,
}

/// Checkout entry: the shipping form prefilled from the saved profile, plus
/// a summary of the cart being paid for.
///
/// A missing profile document prefills nothing; checkout still works.
#[instrument(skip(state), fields(identity = %identity.id))]
pub async fn entry(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let form = match state.docstore().fetch_profile(&identity.id).await? {
        Some(profile) => CheckoutForm::from_profile(&profile),
        None => CheckoutForm::default(),
    };

    let cart = CartView::from(state.carts().view(&identity.id).await);

    Ok(Json(CheckoutEntry { form, cart }))
}

/// Pay by card (mock endpoint) and place the order in one request.
#[instrument(skip(state, request), fields(identity = %identity.id))]
pub async fn pay_card(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(request): Json<PayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let permit = state
        .carts()
        .try_begin_submission(&identity.id)
        .ok_or(CheckoutError::SubmissionInFlight)?;

    let contents = state
        .submission()
        .prepare(&identity, &request.shipping)
        .await?;

    // Payment runs outside the cart lock; the permit keeps a concurrent
    // submission from racing it.
    let confirmation = state
        .card()
        .charge(contents.subtotal, &identity.id)
        .await
        .map_err(CheckoutError::Payment)?;

    let order = state
        .submission()
        .place_order(&permit, &identity, &request.shipping, ConfirmedPayment::card())
        .await?;
    drop(permit);

    let mut response = OrderPlacedResponse::from(&order);
    response.payment_ref = Some(confirmation.payment_id);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Start a GCash redirect checkout: register the cart total with the
/// provider and park the returned handle in the session.
#[instrument(skip(state, session, request), fields(identity = %identity.id))]
pub async fn gcash_create(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    session: Session,
    Json(request): Json<PayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let contents = state
        .submission()
        .prepare(&identity, &request.shipping)
        .await?;

    let checkout = state
        .gcash()
        .create_checkout(contents.subtotal, &request.shipping)
        .await
        .map_err(CheckoutError::Payment)?;

    // The buyer approves exactly this amount while off-site; capture checks
    // the cart against it before placing the order.
    let pending = PendingRedirectCheckout {
        handle: checkout.handle.clone(),
        approved_total: contents.subtotal,
        transaction_ref: None,
    };
    session
        .insert(session_keys::PENDING_REDIRECT_CHECKOUT, &pending)
        .await
        .map_err(AppError::Session)?;

    info!(handle = %checkout.handle, "GCash checkout created");
    Ok(Json(json!({
        "handle": checkout.handle,
        "approval_url": checkout.approval_url,
    })))
}

/// Capture the approved GCash checkout and place the order.
///
/// Capture is refused if the cart no longer totals the amount the buyer
/// approved. When a previous attempt captured the handle but failed to
/// record the order, the stashed transaction reference is reused instead of
/// capturing twice.
#[instrument(skip(state, session, request), fields(identity = %identity.id))]
pub async fn gcash_capture(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    session: Session,
    Json(request): Json<PayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut pending: PendingRedirectCheckout = session
        .get(session_keys::PENDING_REDIRECT_CHECKOUT)
        .await
        .map_err(AppError::Session)?
        .ok_or_else(|| AppError::BadRequest("no pending GCash checkout".to_owned()))?;

    let permit = state
        .carts()
        .try_begin_submission(&identity.id)
        .ok_or(CheckoutError::SubmissionInFlight)?;

    let contents = state
        .submission()
        .prepare(&identity, &request.shipping)
        .await?;

    if !pending.amount_matches(contents.subtotal) {
        return Err(CheckoutError::ApprovedAmountChanged.into());
    }

    let transaction_ref = match pending.transaction_ref.clone() {
        Some(transaction_ref) => transaction_ref,
        None => {
            let captured = state
                .gcash()
                .capture(&pending.handle)
                .await
                .map_err(CheckoutError::Payment)?;
            // Stash before the order write, so a retry after a write failure
            // does not re-capture an already-captured handle.
            pending.transaction_ref = Some(captured.transaction_id.clone());
            session
                .insert(session_keys::PENDING_REDIRECT_CHECKOUT, &pending)
                .await
                .map_err(AppError::Session)?;
            captured.transaction_id
        }
    };

    let order = state
        .submission()
        .place_order(
            &permit,
            &identity,
            &request.shipping,
            ConfirmedPayment::gcash(transaction_ref),
        )
        .await?;
    drop(permit);

    clear_pending_checkout(&session).await?;

    Ok((StatusCode::CREATED, Json(OrderPlacedResponse::from(&order))))
}

/// Abandon the pending GCash checkout. The cart is untouched.
#[instrument(skip(session), fields(identity = %identity.id))]
pub async fn gcash_cancel(
    RequireAuth(identity): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    clear_pending_checkout(&session).await?;
    Ok(Json(json!({ "cancelled": true })))
}

async fn clear_pending_checkout(session: &Session) -> Result<(), AppError> {
    session
        .remove::<PendingRedirectCheckout>(session_keys::PENDING_REDIRECT_CHECKOUT)
        .await
        .map_err(AppError::Session)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use wavecrest_core::{IdentityId, OrderId, OrderStatus, PaymentMethod};

    use super::*;

    fn order(method: PaymentMethod, transaction_ref: Option<String>) -> Order {
        Order {
            id: OrderId::generate(),
            owner: IdentityId::new("maria"),
            items: Vec::new(),
            total: "620.50".parse().unwrap(),
            shipping: CheckoutForm::default(),
            payment_method: method,
            payment_transaction_ref: transaction_ref,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_carries_gcash_transaction_ref() {
        let order = order(PaymentMethod::Gcash, Some("txn_9".to_owned()));
        let response = OrderPlacedResponse::from(&order);

        assert_eq!(response.payment_ref.as_deref(), Some("txn_9"));
        assert_eq!(response.payment_method, "GCash");
        assert_eq!(response.total, "\u{20b1}620.50");
    }

    #[test]
    fn test_card_response_formats_order_fields() {
        let order = order(PaymentMethod::Card, None);
        let mut response = OrderPlacedResponse::from(&order);
        assert!(response.payment_ref.is_none());

        // pay_card fills the mock endpoint's payment ID in afterwards.
        response.payment_ref = Some("pay_abc123".to_owned());
        assert_eq!(response.payment_method, "Credit Card");
        assert_eq!(response.status, "Processing");
        assert_eq!(response.payment_ref.as_deref(), Some("pay_abc123"));
    }
}
