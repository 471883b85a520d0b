//! Cart lifecycle across sign-in and sign-out.
//!
//! The identity-keyed persisted copy must survive sign-out, so whatever was
//! in the cart comes back on the next sign-in. Persistence failures degrade
//! to session-only carts rather than erroring.

#![allow(clippy::unwrap_used)]

use wavecrest_storefront::cart::ActiveCarts;
use wavecrest_storefront::identity::{IdentityEvents, spawn_cart_binding};

use wavecrest_integration_tests::{MemoryPersistence, catalog_item, identity, settle};

#[tokio::test]
async fn test_cart_survives_sign_out_and_sign_in() {
    let persistence = MemoryPersistence::default();
    let carts = ActiveCarts::new(persistence.clone());
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();
    carts.add_item(&maria.id, catalog_item("coffee", "320.50"), 1).await.unwrap();
    settle().await;

    // Sign-out drops the live cart but not the persisted copy.
    carts.unbind(&maria.id).await;
    assert_eq!(persistence.stored_for(&maria.id).unwrap().len(), 2);

    // Sign-in rebinds from persistence.
    let restored = carts.view(&maria.id).await;
    assert_eq!(restored.item_count, 3);
    assert_eq!(restored.subtotal, "620.50".parse().unwrap());
}

#[tokio::test]
async fn test_adding_same_product_accumulates_quantity() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();
    let contents = carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();

    assert_eq!(contents.items.len(), 1);
    assert_eq!(contents.items[0].quantity, 3);
    assert_eq!(contents.subtotal, "450".parse().unwrap());
}

#[tokio::test]
async fn test_save_failures_degrade_to_session_only_cart() {
    let persistence = MemoryPersistence::default();
    persistence.fail_saves(true);
    let carts = ActiveCarts::new(persistence.clone());
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();
    settle().await;

    // Nothing persisted, but the live cart works normally.
    assert!(persistence.stored_for(&maria.id).is_none());
    assert_eq!(carts.view(&maria.id).await.item_count, 1);

    // After sign-out the unsaved cart is gone for good.
    carts.unbind(&maria.id).await;
    assert_eq!(carts.view(&maria.id).await.item_count, 0);
}

#[tokio::test]
async fn test_identity_events_drive_cart_binding() {
    let persistence = MemoryPersistence::default();
    let carts = ActiveCarts::new(persistence.clone());
    let events = IdentityEvents::new();
    let task = spawn_cart_binding(&events, carts.clone());
    let maria = identity("maria");

    // Seed a persisted cart, then announce sign-in.
    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();
    settle().await;
    carts.unbind(&maria.id).await;

    events.signed_in(maria.clone());
    settle().await;
    assert_eq!(carts.view(&maria.id).await.item_count, 2);

    events.signed_out(maria.id.clone());
    settle().await;
    // Persisted copy still there for the next sign-in.
    assert_eq!(persistence.stored_for(&maria.id).unwrap().len(), 1);

    task.abort();
}

#[tokio::test]
async fn test_signed_out_event_destroys_live_cart() {
    let persistence = MemoryPersistence::default();
    // Saves fail, so the only copy of the cart is the live one. The
    // signed-out event must destroy it; an empty cart comes back after.
    persistence.fail_saves(true);
    let carts = ActiveCarts::new(persistence.clone());
    let events = IdentityEvents::new();
    let task = spawn_cart_binding(&events, carts.clone());
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();
    settle().await;
    assert_eq!(carts.view(&maria.id).await.item_count, 1);

    events.signed_out(maria.id.clone());
    settle().await;
    assert_eq!(carts.view(&maria.id).await.item_count, 0);

    task.abort();
}

#[tokio::test]
async fn test_carts_do_not_leak_between_identities() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let maria = identity("maria");
    let juan = identity("juan");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();

    assert_eq!(carts.view(&juan.id).await.item_count, 0);
    assert_eq!(carts.view(&maria.id).await.item_count, 1);
}
