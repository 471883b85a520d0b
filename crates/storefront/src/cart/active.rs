//! Identity-keyed registry of live carts.
//!
//! [`ActiveCarts`] owns one [`CartStore`] per signed-in identity, loads it
//! from the persistence adapter on first access, and persists every mutation
//! with a fire-and-forget save. It also issues the per-identity submission
//! permits that keep the checkout path non-reentrant.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use wavecrest_core::{IdentityId, ProductId};

use super::persistence::CartPersistence;
use super::{CartError, CartStore, LineItem, NewLineItem};

/// A point-in-time copy of one cart's contents and derived values.
#[derive(Debug, Clone)]
pub struct CartContents {
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

/// Registry of live carts, one per signed-in identity.
///
/// Cheaply cloneable via `Arc`.
pub struct ActiveCarts<P> {
    inner: Arc<ActiveCartsInner<P>>,
}

impl<P> Clone for ActiveCarts<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ActiveCartsInner<P> {
    persistence: P,
    carts: RwLock<HashMap<IdentityId, Arc<Mutex<CartStore>>>>,
    // Identities with an order submission outstanding. Guards the
    // snapshot -> write -> clear critical section against double-submit.
    in_flight: StdMutex<HashSet<IdentityId>>,
}

impl<P: CartPersistence> ActiveCarts<P> {
    /// Create a registry backed by the given persistence adapter.
    #[must_use]
    pub fn new(persistence: P) -> Self {
        Self {
            inner: Arc::new(ActiveCartsInner {
                persistence,
                carts: RwLock::new(HashMap::new()),
                in_flight: StdMutex::new(HashSet::new()),
            }),
        }
    }

    /// Get the live cart for an identity, binding and loading it from the
    /// persistence adapter on first access.
    ///
    /// A failed load is logged and treated as an empty cart; the in-memory
    /// cart is authoritative for the rest of the session.
    pub async fn cart_for(&self, identity: &IdentityId) -> Arc<Mutex<CartStore>> {
        if let Some(cart) = self.inner.carts.read().await.get(identity) {
            return Arc::clone(cart);
        }

        // Hold the write lock across the load so concurrent first accesses
        // for the same identity do not race each other's loads.
        let mut carts = self.inner.carts.write().await;
        if let Some(cart) = carts.get(identity) {
            return Arc::clone(cart);
        }

        let items = match self.inner.persistence.load(identity).await {
            Ok(items) => items,
            Err(e) => {
                warn!(identity = %identity, error = %e, "Failed to load stored cart, starting empty");
                Vec::new()
            }
        };

        let mut store = CartStore::new();
        store.bind(identity.clone(), items);
        let cart = Arc::new(Mutex::new(store));
        carts.insert(identity.clone(), Arc::clone(&cart));
        cart
    }

    /// Destroy the identity's live cart (sign-out).
    ///
    /// The in-memory contents are cleared; the identity-keyed persisted copy
    /// is left in place so a later sign-in restores it.
    pub async fn unbind(&self, identity: &IdentityId) {
        let removed = self.inner.carts.write().await.remove(identity);
        if let Some(cart) = removed {
            cart.lock().await.unbind();
        }
    }

    /// Add a product to the identity's cart and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] when the underlying store refuses the mutation.
    pub async fn add_item(
        &self,
        identity: &IdentityId,
        item: NewLineItem,
        quantity: u32,
    ) -> Result<CartContents, CartError> {
        let cart = self.cart_for(identity).await;
        let contents = {
            let mut store = cart.lock().await;
            store.add(item, quantity)?;
            contents_of(&store)
        };
        self.persist_async(identity.clone(), contents.items.clone());
        Ok(contents)
    }

    /// Remove a product from the identity's cart and persist the result.
    /// Removing an absent product is a no-op.
    pub async fn remove_item(&self, identity: &IdentityId, product_id: &ProductId) -> CartContents {
        let cart = self.cart_for(identity).await;
        let contents = {
            let mut store = cart.lock().await;
            store.remove(product_id);
            contents_of(&store)
        };
        self.persist_async(identity.clone(), contents.items.clone());
        contents
    }

    /// Empty the identity's cart and persist the empty cart.
    pub async fn clear(&self, identity: &IdentityId) -> CartContents {
        let cart = self.cart_for(identity).await;
        let contents = {
            let mut store = cart.lock().await;
            store.clear();
            contents_of(&store)
        };
        self.persist_async(identity.clone(), Vec::new());
        contents
    }

    /// A point-in-time view of the identity's cart.
    pub async fn view(&self, identity: &IdentityId) -> CartContents {
        let cart = self.cart_for(identity).await;
        let store = cart.lock().await;
        contents_of(&store)
    }

    /// Begin an order submission for an identity.
    ///
    /// Returns `None` when a submission for this identity is already
    /// outstanding; the permit releases the slot on drop.
    pub fn try_begin_submission(&self, identity: &IdentityId) -> Option<SubmissionPermit<P>> {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !in_flight.insert(identity.clone()) {
            return None;
        }
        Some(SubmissionPermit {
            carts: self.clone(),
            identity: identity.clone(),
        })
    }

    /// Persist cart contents in the background.
    ///
    /// Failures are logged and otherwise ignored; the in-memory cart remains
    /// authoritative for the current session.
    pub(crate) fn persist_async(&self, identity: IdentityId, items: Vec<LineItem>) {
        let persistence = self.inner.persistence.clone();
        tokio::spawn(async move {
            if let Err(e) = persistence.save(&identity, &items).await {
                warn!(identity = %identity, error = %e, "Failed to persist cart; in-memory cart remains authoritative");
            }
        });
    }

    fn end_submission(&self, identity: &IdentityId) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        in_flight.remove(identity);
    }
}

fn contents_of(store: &CartStore) -> CartContents {
    CartContents {
        items: store.snapshot(),
        subtotal: store.subtotal(),
        item_count: store.total_item_count(),
    }
}

/// Exclusive right to run the order submission critical section for one
/// identity. Released on drop, including on early return and panic.
pub struct SubmissionPermit<P: CartPersistence> {
    carts: ActiveCarts<P>,
    identity: IdentityId,
}

impl<P: CartPersistence> SubmissionPermit<P> {
    /// The identity this permit belongs to.
    #[must_use]
    pub const fn identity(&self) -> &IdentityId {
        &self.identity
    }
}

impl<P: CartPersistence> Drop for SubmissionPermit<P> {
    fn drop(&mut self) {
        self.carts.end_submission(&self.identity);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap as PlainMap;

    use super::super::persistence::PersistenceError;
    use super::*;

    /// In-memory persistence double with optional failure injection.
    #[derive(Clone, Default)]
    struct MemoryPersistence {
        stored: Arc<StdMutex<PlainMap<IdentityId, Vec<LineItem>>>>,
        fail_saves: Arc<StdMutex<bool>>,
    }

    impl MemoryPersistence {
        fn stored_for(&self, identity: &IdentityId) -> Option<Vec<LineItem>> {
            self.stored.lock().unwrap().get(identity).cloned()
        }
    }

    impl CartPersistence for MemoryPersistence {
        async fn save(
            &self,
            identity: &IdentityId,
            items: &[LineItem],
        ) -> Result<(), PersistenceError> {
            if *self.fail_saves.lock().unwrap() {
                return Err(PersistenceError::Storage("save rejected".to_owned()));
            }
            self.stored
                .lock()
                .unwrap()
                .insert(identity.clone(), items.to_vec());
            Ok(())
        }

        async fn load(&self, identity: &IdentityId) -> Result<Vec<LineItem>, PersistenceError> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .get(identity)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn new_item(id: &str, unit_price: &str) -> NewLineItem {
        NewLineItem {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            image_ref: format!("/images/{id}.jpg"),
            unit_price: unit_price.parse().unwrap(),
            description: String::new(),
        }
    }

    async fn settle() {
        // Let spawned persistence tasks run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_per_identity() {
        let persistence = MemoryPersistence::default();
        let carts = ActiveCarts::new(persistence.clone());
        let alice = IdentityId::new("alice");

        carts.add_item(&alice, new_item("A", "100"), 2).await.unwrap();
        settle().await;

        let stored = persistence.stored_for(&alice).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.first().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_sign_out_then_sign_in_restores_saved_cart() {
        let persistence = MemoryPersistence::default();
        let carts = ActiveCarts::new(persistence.clone());
        let alice = IdentityId::new("alice");

        carts.add_item(&alice, new_item("A", "100"), 2).await.unwrap();
        carts.add_item(&alice, new_item("B", "50"), 1).await.unwrap();
        settle().await;

        carts.unbind(&alice).await;

        // Rebinding loads exactly the items last saved for this identity.
        let restored = carts.view(&alice).await;
        assert_eq!(restored.items.len(), 2);
        assert_eq!(restored.subtotal, "250".parse().unwrap());
        assert_eq!(restored.item_count, 3);
    }

    #[tokio::test]
    async fn test_save_failure_leaves_in_memory_cart_authoritative() {
        let persistence = MemoryPersistence::default();
        *persistence.fail_saves.lock().unwrap() = true;
        let carts = ActiveCarts::new(persistence.clone());
        let alice = IdentityId::new("alice");

        carts.add_item(&alice, new_item("A", "100"), 1).await.unwrap();
        settle().await;

        assert!(persistence.stored_for(&alice).is_none());
        let view = carts.view(&alice).await;
        assert_eq!(view.item_count, 1);
    }

    #[tokio::test]
    async fn test_submission_permit_is_exclusive_per_identity() {
        let carts = ActiveCarts::new(MemoryPersistence::default());
        let alice = IdentityId::new("alice");
        let bob = IdentityId::new("bob");

        let permit = carts.try_begin_submission(&alice).unwrap();
        assert!(carts.try_begin_submission(&alice).is_none());
        // Other identities are unaffected.
        assert!(carts.try_begin_submission(&bob).is_some());

        drop(permit);
        assert!(carts.try_begin_submission(&alice).is_some());
    }

    #[tokio::test]
    async fn test_carts_are_isolated_between_identities() {
        let carts = ActiveCarts::new(MemoryPersistence::default());
        let alice = IdentityId::new("alice");
        let bob = IdentityId::new("bob");

        carts.add_item(&alice, new_item("A", "100"), 1).await.unwrap();

        assert_eq!(carts.view(&bob).await.item_count, 0);
        assert_eq!(carts.view(&alice).await.item_count, 1);
    }
}
