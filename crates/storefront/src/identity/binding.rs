//! Identity event broadcast and cart binding.
//!
//! Route handlers announce sign-in and sign-out over a broadcast channel;
//! a background task drives the cart registry from those events. Signing in
//! binds a cart loaded from persistence, signing out drops the in-memory
//! cart while the persisted copy stays put so the next sign-in restores it.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wavecrest_core::IdentityId;

use super::Identity;
use crate::cart::{ActiveCarts, CartPersistence};

/// An identity lifecycle transition.
#[derive(Debug, Clone)]
pub enum IdentityEvent {
    SignedIn(Identity),
    SignedOut(IdentityId),
}

/// Broadcast channel for identity events.
#[derive(Clone)]
pub struct IdentityEvents {
    sender: broadcast::Sender<IdentityEvent>,
}

impl IdentityEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Announce a sign-in. Delivery is best-effort; with no subscriber the
    /// event is dropped.
    pub fn signed_in(&self, identity: Identity) {
        let _ = self.sender.send(IdentityEvent::SignedIn(identity));
    }

    /// Announce a sign-out.
    pub fn signed_out(&self, identity: IdentityId) {
        let _ = self.sender.send(IdentityEvent::SignedOut(identity));
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.sender.subscribe()
    }
}

impl Default for IdentityEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the background task that keeps the cart registry in step with
/// identity events. Runs until the event channel closes.
pub fn spawn_cart_binding<P: CartPersistence>(
    events: &IdentityEvents,
    carts: ActiveCarts<P>,
) -> JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(IdentityEvent::SignedIn(identity)) => {
                    debug!(identity = %identity.id, "binding cart for sign-in");
                    carts.cart_for(&identity.id).await;
                }
                Ok(IdentityEvent::SignedOut(identity)) => {
                    debug!(identity = %identity, "dropping cart for sign-out");
                    carts.unbind(&identity).await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Carts self-heal on next access, so lag is only noise.
                    warn!(missed, "identity event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity {
            id: IdentityId::from(id),
            email: format!("{id}@example.com"),
        }
    }

    #[tokio::test]
    async fn test_events_reach_subscriber() {
        let events = IdentityEvents::new();
        let mut receiver = events.subscribe();

        events.signed_in(identity("alice"));
        events.signed_out(IdentityId::from("alice"));

        assert!(matches!(
            receiver.recv().await.unwrap(),
            IdentityEvent::SignedIn(_)
        ));
        assert!(matches!(
            receiver.recv().await.unwrap(),
            IdentityEvent::SignedOut(_)
        ));
    }

    #[tokio::test]
    async fn test_send_without_subscriber_does_not_panic() {
        let events = IdentityEvents::new();
        events.signed_in(identity("bob"));
    }
}
