//! Payment confirmation clients.
//!
//! Two protocols feed the same order-creation path:
//!
//! - [`mock::MockPaymentClient`] confirms a card charge synchronously against
//!   the mock payment endpoint.
//! - [`redirect::GcashClient`] drives the buyer-approval redirect flow:
//!   create a provider checkout, wait for the buyer's approval off-site, then
//!   capture for a transaction reference.
//!
//! Both produce a [`ConfirmedPayment`]; order submission never talks to a
//! payment provider itself.

pub mod mock;
pub mod redirect;

pub use mock::MockPaymentClient;
pub use redirect::GcashClient;

use wavecrest_core::PaymentMethod;

/// Errors from either payment protocol.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The provider declined the payment. Retryable by the user.
    #[error("payment declined: {0}")]
    Declined(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error response.
    #[error("payment API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The provider response could not be decoded.
    #[error("payment response parse error: {0}")]
    Parse(String),
}

/// A confirmed payment, ready to be attached to an order.
///
/// The transaction reference is present only for the redirect protocol,
/// where capture returns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedPayment {
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
}

impl ConfirmedPayment {
    /// A synchronous card confirmation (no transaction reference).
    #[must_use]
    pub const fn card() -> Self {
        Self {
            method: PaymentMethod::Card,
            transaction_ref: None,
        }
    }

    /// A captured redirect payment carrying the provider's transaction ID.
    #[must_use]
    pub const fn gcash(transaction_ref: String) -> Self {
        Self {
            method: PaymentMethod::Gcash,
            transaction_ref: Some(transaction_ref),
        }
    }
}
