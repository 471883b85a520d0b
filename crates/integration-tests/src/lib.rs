//! Integration test support for Wavecrest.
//!
//! In-memory doubles for the two persistence seams, so cart and checkout
//! behavior can be exercised end to end without Postgres or the document
//! store:
//!
//! - [`MemoryPersistence`] stands in for the Postgres cart adapter
//! - [`MemoryOrders`] stands in for the document store's order collection
//!
//! Both support failure injection to drive the degraded paths.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wavecrest_core::IdentityId;
use wavecrest_storefront::cart::persistence::{CartPersistence, PersistenceError};
use wavecrest_storefront::cart::{LineItem, NewLineItem};
use wavecrest_storefront::checkout::CheckoutForm;
use wavecrest_storefront::docstore::orders::OrderStore;
use wavecrest_storefront::docstore::DocStoreError;
use wavecrest_storefront::identity::Identity;
use wavecrest_storefront::models::Order;

/// In-memory cart persistence with failure injection.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    stored: Arc<Mutex<HashMap<IdentityId, Vec<LineItem>>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryPersistence {
    /// The items last saved for an identity, or `None` if never saved.
    #[must_use]
    pub fn stored_for(&self, identity: &IdentityId) -> Option<Vec<LineItem>> {
        lock(&self.stored).get(identity).cloned()
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self, fail: bool) {
        *lock(&self.fail_saves) = fail;
    }
}

impl CartPersistence for MemoryPersistence {
    async fn save(&self, identity: &IdentityId, items: &[LineItem]) -> Result<(), PersistenceError> {
        if *lock(&self.fail_saves) {
            return Err(PersistenceError::Storage("save rejected".to_owned()));
        }
        lock(&self.stored).insert(identity.clone(), items.to_vec());
        Ok(())
    }

    async fn load(&self, identity: &IdentityId) -> Result<Vec<LineItem>, PersistenceError> {
        Ok(lock(&self.stored).get(identity).cloned().unwrap_or_default())
    }
}

/// In-memory order store with failure injection.
#[derive(Clone, Default)]
pub struct MemoryOrders {
    orders: Arc<Mutex<Vec<Order>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryOrders {
    /// All orders written so far.
    #[must_use]
    pub fn all(&self) -> Vec<Order> {
        lock(&self.orders).clone()
    }

    /// Make subsequent writes fail.
    pub fn fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }
}

impl OrderStore for MemoryOrders {
    async fn create_order(&self, order: &Order) -> Result<(), DocStoreError> {
        if *lock(&self.fail_writes) {
            return Err(DocStoreError::Api {
                status: 503,
                message: "store unavailable".to_owned(),
            });
        }
        lock(&self.orders).push(order.clone());
        Ok(())
    }

    async fn orders_for_owner(&self, owner: &IdentityId) -> Result<Vec<Order>, DocStoreError> {
        let mut orders: Vec<Order> = lock(&self.orders)
            .iter()
            .filter(|o| &o.owner == owner)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A signed-in test identity.
#[must_use]
pub fn identity(id: &str) -> Identity {
    Identity {
        id: IdentityId::new(id),
        email: format!("{id}@example.com"),
    }
}

/// A product ready to be added to a cart. An unparseable price becomes zero.
#[must_use]
pub fn catalog_item(id: &str, unit_price: &str) -> NewLineItem {
    NewLineItem {
        product_id: id.into(),
        title: format!("Product {id}"),
        image_ref: format!("/images/{id}.jpg"),
        unit_price: unit_price.parse().unwrap_or_default(),
        description: String::new(),
    }
}

/// A fully filled shipping form.
#[must_use]
pub fn valid_shipping() -> CheckoutForm {
    CheckoutForm {
        first_name: "Maria".to_owned(),
        last_name: "Santos".to_owned(),
        address: "123 Mango St".to_owned(),
        city: "Cebu".to_owned(),
        zip: "6000".to_owned(),
        phone: "09171234567".to_owned(),
        special_instructions: String::new(),
    }
}

/// Yield to the runtime so fire-and-forget persistence tasks can run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
