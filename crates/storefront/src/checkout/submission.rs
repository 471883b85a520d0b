//! Order submission.
//!
//! The critical section between "payment confirmed" and "cart emptied" lives
//! here. The rules it enforces:
//!
//! - an order is only created from a non-empty cart with a valid shipping
//!   form, checked again after payment with the cart lock held;
//! - the order write happens before the cart is cleared, so a store failure
//!   leaves the cart exactly as it was and the attempt can be retried;
//! - at most one submission per identity runs at a time, enforced by the
//!   [`SubmissionPermit`] the caller must already hold.

use chrono::Utc;
use tracing::{info, instrument, warn};
use wavecrest_core::{OrderId, OrderStatus};

use crate::cart::{ActiveCarts, CartContents, CartPersistence, SubmissionPermit};
use crate::docstore::{DocStoreError, OrderStore};
use crate::identity::Identity;
use crate::models::Order;
use crate::payments::{ConfirmedPayment, PaymentError};
use crate::services::ReceiptClient;

use super::form::{CheckoutForm, RequiredField};

/// Errors along the checkout path.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The cart is empty; checkout never reaches a payment provider.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// Required shipping fields are missing.
    #[error("missing required fields")]
    Validation(Vec<RequiredField>),

    /// An order submission for this identity is already in flight.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The cart changed while the buyer was off-site approving the payment,
    /// so the approved amount no longer covers the cart.
    #[error("cart total no longer matches the approved payment amount")]
    ApprovedAmountChanged,

    /// The submission permit presented was issued for a different identity.
    #[error("submission permit does not match the submitting identity")]
    PermitMismatch,

    /// Payment confirmation failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The order store rejected the write. The cart is unchanged.
    #[error("failed to record order: {0}")]
    OrderWrite(#[from] DocStoreError),
}

/// Coordinates cart, order store, and receipts for order placement.
#[derive(Clone)]
pub struct OrderSubmission<P, S> {
    carts: ActiveCarts<P>,
    orders: S,
    receipts: Option<ReceiptClient>,
}

impl<P: CartPersistence, S: OrderStore> OrderSubmission<P, S> {
    #[must_use]
    pub fn new(carts: ActiveCarts<P>, orders: S, receipts: Option<ReceiptClient>) -> Self {
        Self {
            carts,
            orders,
            receipts,
        }
    }

    /// Check the preconditions for checkout: a valid shipping form and a
    /// non-empty cart. Run before any payment provider is contacted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] or [`CheckoutError::EmptyCart`].
    pub async fn prepare(
        &self,
        identity: &Identity,
        shipping: &CheckoutForm,
    ) -> Result<CartContents, CheckoutError> {
        shipping.validate().map_err(CheckoutError::Validation)?;

        let contents = self.carts.view(&identity.id).await;
        if contents.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(contents)
    }

    /// Create the order from the cart's current contents and, only on a
    /// successful store write, empty the cart.
    ///
    /// The caller proves exclusivity by passing the [`SubmissionPermit`] it
    /// obtained for this identity; the cart lock is held across the snapshot,
    /// the store write, and the clear, so no concurrent mutation can slip
    /// between them.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart emptied since
    /// `prepare`, and [`CheckoutError::OrderWrite`] when the store write
    /// fails; in both cases the cart is left untouched. A permit issued for
    /// a different identity is refused with [`CheckoutError::PermitMismatch`].
    #[instrument(skip_all, fields(identity = %identity.id))]
    pub async fn place_order(
        &self,
        permit: &SubmissionPermit<P>,
        identity: &Identity,
        shipping: &CheckoutForm,
        payment: ConfirmedPayment,
    ) -> Result<Order, CheckoutError> {
        if permit.identity() != &identity.id {
            return Err(CheckoutError::PermitMismatch);
        }

        let cart = self.carts.cart_for(&identity.id).await;
        let mut store = cart.lock().await;

        let items = store.snapshot();
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = Order {
            id: OrderId::generate(),
            owner: identity.id.clone(),
            items,
            total: store.subtotal(),
            shipping: shipping.clone(),
            payment_method: payment.method,
            payment_transaction_ref: payment.transaction_ref,
            status: OrderStatus::Processing,
            created_at: Utc::now(),
        };

        // Order first, cart second. If this write fails the cart is intact
        // and the buyer can retry.
        self.orders.create_order(&order).await?;

        store.clear();
        drop(store);
        self.carts.persist_async(identity.id.clone(), Vec::new());

        info!(order_id = %order.id, total = %order.total, method = ?order.payment_method, "Order placed");

        if let Some(receipts) = &self.receipts {
            receipts.dispatch(&order, &identity.email);
        }

        Ok(order)
    }
}
