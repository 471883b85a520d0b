//! Order domain type.
//!
//! An order is an immutable snapshot of a cart and shipping form at the
//! moment of payment confirmation. Once written to the document store the
//! storefront relinquishes ownership: only administrative action mutates the
//! status, and nothing here deletes an order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wavecrest_core::{IdentityId, OrderId, OrderStatus, PaymentMethod};

use crate::cart::LineItem;
use crate::checkout::form::CheckoutForm;

/// A durable order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: IdentityId,
    /// Snapshot of the cart at submission time.
    pub items: Vec<LineItem>,
    /// Sum of `unit_price * quantity` over `items` at submission time.
    pub total: Decimal,
    /// Snapshot of the shipping form at submission time.
    pub shipping: CheckoutForm,
    pub payment_method: PaymentMethod,
    /// Transaction reference from the redirect payment provider, when the
    /// order was paid through the buyer-approval flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_transaction_ref: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
