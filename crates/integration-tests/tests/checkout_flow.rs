//! End-to-end checkout flows over the in-memory doubles.
//!
//! Exercises the full path from cart mutation through order placement,
//! including the failure modes that must leave the cart untouched.

#![allow(clippy::unwrap_used)]

use wavecrest_core::{OrderStatus, PaymentMethod};
use wavecrest_storefront::cart::ActiveCarts;
use wavecrest_storefront::checkout::{CheckoutError, CheckoutForm, OrderSubmission};
use wavecrest_storefront::docstore::orders::OrderStore as _;
use wavecrest_storefront::models::PendingRedirectCheckout;
use wavecrest_storefront::payments::{ConfirmedPayment, PaymentError};

use wavecrest_integration_tests::{
    MemoryOrders, MemoryPersistence, catalog_item, identity, settle, valid_shipping,
};

#[tokio::test]
async fn test_card_checkout_places_one_order_and_empties_cart() {
    let persistence = MemoryPersistence::default();
    let orders = MemoryOrders::default();
    let carts = ActiveCarts::new(persistence.clone());
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();
    carts.add_item(&maria.id, catalog_item("coffee", "320.50"), 1).await.unwrap();

    let contents = submission.prepare(&maria, &valid_shipping()).await.unwrap();
    assert_eq!(contents.subtotal, "620.50".parse().unwrap());

    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let order = submission
        .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
        .await
        .unwrap();
    drop(permit);
    settle().await;

    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_method, PaymentMethod::Card);
    assert_eq!(order.total, "620.50".parse().unwrap());
    assert_eq!(order.items.len(), 2);

    // Exactly one order, cart emptied in memory and in persistence.
    assert_eq!(orders.all().len(), 1);
    assert_eq!(carts.view(&maria.id).await.item_count, 0);
    assert_eq!(persistence.stored_for(&maria.id).unwrap().len(), 0);
}

#[tokio::test]
async fn test_gcash_checkout_records_transaction_ref() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();

    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let order = submission
        .place_order(
            &permit,
            &maria,
            &valid_shipping(),
            ConfirmedPayment::gcash("txn_abc".to_owned()),
        )
        .await
        .unwrap();

    assert_eq!(order.payment_method, PaymentMethod::Gcash);
    assert_eq!(order.payment_transaction_ref.as_deref(), Some("txn_abc"));
}

#[tokio::test]
async fn test_declined_payment_leaves_cart_unchanged_and_no_order() {
    let persistence = MemoryPersistence::default();
    let orders = MemoryOrders::default();
    let carts = ActiveCarts::new(persistence.clone());
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();
    carts.add_item(&maria.id, catalog_item("coffee", "320.50"), 1).await.unwrap();
    settle().await;

    // The provider declines after prepare; the attempt ends before order
    // placement is ever reached, exactly as the card handler sequences it.
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let contents = submission.prepare(&maria, &valid_shipping()).await.unwrap();
    let declined: Result<ConfirmedPayment, CheckoutError> =
        Err(PaymentError::Declined("card payment was not approved".to_owned()).into());
    assert!(matches!(
        declined,
        Err(CheckoutError::Payment(PaymentError::Declined(_)))
    ));
    drop(permit);
    settle().await;

    // Zero orders, cart and persisted copy unchanged.
    assert!(orders.all().is_empty());
    let view = carts.view(&maria.id).await;
    assert_eq!(view.item_count, 3);
    assert_eq!(view.subtotal, contents.subtotal);
    assert_eq!(persistence.stored_for(&maria.id).unwrap().len(), 2);

    // The buyer can try again with the same cart once payment is approved.
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let order = submission
        .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
        .await
        .unwrap();
    assert_eq!(order.total, contents.subtotal);
    assert_eq!(orders.all().len(), 1);
}

#[tokio::test]
async fn test_capture_is_refused_when_cart_drifts_from_approved_amount() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();

    // The buyer goes off-site having approved the subtotal at create time.
    let approved = submission.prepare(&maria, &valid_shipping()).await.unwrap();
    let pending = PendingRedirectCheckout {
        handle: "chk_1".to_owned(),
        approved_total: approved.subtotal,
        transaction_ref: None,
    };

    // The cart mutates while they are away; capture must not go through.
    carts.add_item(&maria.id, catalog_item("coffee", "320.50"), 1).await.unwrap();
    let current = submission.prepare(&maria, &valid_shipping()).await.unwrap();
    assert!(!pending.amount_matches(current.subtotal));
    assert!(orders.all().is_empty());

    // Back at the approved amount, capture may proceed.
    carts.remove_item(&maria.id, &"coffee".into()).await;
    let current = submission.prepare(&maria, &valid_shipping()).await.unwrap();
    assert!(pending.amount_matches(current.subtotal));
}

#[tokio::test]
async fn test_gcash_retry_after_write_failure_reuses_captured_transaction() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();

    // Capture succeeded and the reference was stashed, but the order write
    // failed; the cart is intact for the retry.
    let pending = PendingRedirectCheckout {
        handle: "chk_1".to_owned(),
        approved_total: "150".parse().unwrap(),
        transaction_ref: Some("txn_once".to_owned()),
    };
    orders.fail_writes(true);
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let err = submission
        .place_order(
            &permit,
            &maria,
            &valid_shipping(),
            ConfirmedPayment::gcash(pending.transaction_ref.clone().unwrap()),
        )
        .await
        .unwrap_err();
    drop(permit);
    assert!(matches!(err, CheckoutError::OrderWrite(_)));
    assert_eq!(carts.view(&maria.id).await.item_count, 1);

    // The retry skips capture and reuses the stashed reference.
    orders.fail_writes(false);
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let order = submission
        .place_order(
            &permit,
            &maria,
            &valid_shipping(),
            ConfirmedPayment::gcash(pending.transaction_ref.clone().unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(order.payment_transaction_ref.as_deref(), Some("txn_once"));
    assert_eq!(orders.all().len(), 1);
}

#[tokio::test]
async fn test_order_write_failure_leaves_cart_for_retry() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 2).await.unwrap();

    orders.fail_writes(true);
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let err = submission
        .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
        .await
        .unwrap_err();
    drop(permit);

    assert!(matches!(err, CheckoutError::OrderWrite(_)));
    assert!(orders.all().is_empty());
    assert_eq!(carts.view(&maria.id).await.item_count, 2);

    // Store recovers; the retry succeeds with the same cart.
    orders.fail_writes(false);
    let permit = carts.try_begin_submission(&maria.id).unwrap();
    let order = submission
        .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
        .await
        .unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(orders.all().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_is_refused_before_payment() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let submission = OrderSubmission::new(carts.clone(), MemoryOrders::default(), None);
    let maria = identity("maria");

    let err = submission.prepare(&maria, &valid_shipping()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[tokio::test]
async fn test_invalid_shipping_reports_all_missing_fields() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let submission = OrderSubmission::new(carts.clone(), MemoryOrders::default(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();

    let form = CheckoutForm {
        first_name: "Maria".to_owned(),
        ..CheckoutForm::default()
    };
    let err = submission.prepare(&maria, &form).await.unwrap_err();
    match err {
        CheckoutError::Validation(missing) => assert_eq!(missing.len(), 5),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_submissions_yield_exactly_one_order() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    carts.add_item(&maria.id, catalog_item("mangoes", "150"), 1).await.unwrap();

    // Both requests race for the permit; only one can hold it.
    let first = carts.try_begin_submission(&maria.id);
    let second = carts.try_begin_submission(&maria.id);
    assert!(first.is_some());
    assert!(second.is_none());

    let permit = first.unwrap();
    submission
        .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
        .await
        .unwrap();
    drop(permit);

    assert_eq!(orders.all().len(), 1);
}

#[tokio::test]
async fn test_order_history_is_newest_first() {
    let carts = ActiveCarts::new(MemoryPersistence::default());
    let orders = MemoryOrders::default();
    let submission = OrderSubmission::new(carts.clone(), orders.clone(), None);
    let maria = identity("maria");

    for product in ["mangoes", "coffee"] {
        carts.add_item(&maria.id, catalog_item(product, "100"), 1).await.unwrap();
        let permit = carts.try_begin_submission(&maria.id).unwrap();
        submission
            .place_order(&permit, &maria, &valid_shipping(), ConfirmedPayment::card())
            .await
            .unwrap();
    }

    let history = orders.orders_for_owner(&maria.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);

    // Another identity sees nothing.
    let history = orders.orders_for_owner(&identity("juan").id).await.unwrap();
    assert!(history.is_empty());
}
