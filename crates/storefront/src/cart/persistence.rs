//! Cart persistence adapter contract.
//!
//! Durable, identity-keyed storage of cart contents across sessions on one
//! device. Saves are last-write-wins; there is no cross-device merge. The
//! in-memory [`CartStore`](super::CartStore) remains authoritative for the
//! session, so save failures are logged by callers and otherwise ignored.

use std::future::Future;

use wavecrest_core::IdentityId;

use super::LineItem;

/// Errors from the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backing store rejected the read or write.
    #[error("cart storage error: {0}")]
    Storage(String),

    /// A stored cart could not be decoded.
    #[error("stored cart is corrupt: {0}")]
    Corrupt(String),
}

/// Identity-keyed durable storage for cart contents.
///
/// Implementations overwrite any prior value on `save` and return an empty
/// cart from `load` when nothing was stored for the identity.
pub trait CartPersistence: Clone + Send + Sync + 'static {
    /// Durably store the cart contents for an identity, replacing any prior
    /// value.
    fn save(
        &self,
        identity: &IdentityId,
        items: &[LineItem],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Return the last saved contents for an identity, or an empty cart if
    /// none exists.
    fn load(
        &self,
        identity: &IdentityId,
    ) -> impl Future<Output = Result<Vec<LineItem>, PersistenceError>> + Send;
}
