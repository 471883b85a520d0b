//! Session-resident state.
//!
//! All session reads and writes go through the keys below so the set of
//! session-resident state stays visible in one place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Keys used to store data in the session.
pub mod session_keys {
    /// The signed-in identity (`crate::identity::Identity`).
    pub const CURRENT_IDENTITY: &str = "current_identity";

    /// Outstanding redirect-payment checkout
    /// ([`PendingRedirectCheckout`](super::PendingRedirectCheckout)), keyed
    /// per session while the buyer is away approving the payment.
    pub const PENDING_REDIRECT_CHECKOUT: &str = "pending_redirect_checkout";
}

/// A redirect-payment checkout awaiting capture.
///
/// Created when the provider checkout is registered and kept in the session
/// until the order is placed or the buyer cancels. The buyer approved exactly
/// `approved_total`; capture is refused if the cart drifts away from that
/// amount while they were off-site. Once capture succeeds the transaction
/// reference is stashed here, so a retry after a failed order write can skip
/// straight to the write instead of capturing the handle twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRedirectCheckout {
    /// The provider's checkout handle.
    pub handle: String,
    /// The cart subtotal the buyer approved at create time.
    pub approved_total: Decimal,
    /// Transaction reference from a capture that already succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
}

impl PendingRedirectCheckout {
    /// Whether the cart still totals the amount the buyer approved.
    #[must_use]
    pub fn amount_matches(&self, subtotal: Decimal) -> bool {
        self.approved_total == subtotal
    }
}
