//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Auth
//! POST /auth/signup            - Create account (and profile document)
//! POST /auth/login             - Sign in, bind cart
//! POST /auth/logout            - Sign out, drop live cart
//!
//! # Cart
//! GET  /cart                   - Cart contents (empty view for guests)
//! POST /cart/add               - Add product (requires auth)
//! POST /cart/remove            - Remove product (requires auth)
//! POST /cart/clear             - Empty the cart (requires auth)
//! GET  /cart/count             - Item count badge
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Prefilled shipping form + cart summary
//! POST /checkout/card          - Pay by card (mock) and place the order
//! POST /checkout/gcash/create  - Start the GCash approval redirect
//! POST /checkout/gcash/capture - Capture after approval and place the order
//! POST /checkout/gcash/cancel  - Abandon the pending GCash checkout
//!
//! # Account (requires auth)
//! GET  /account/orders         - Order history, newest first
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::entry))
        .route("/card", post(checkout::pay_card))
        .route("/gcash/create", post(checkout::gcash_create))
        .route("/gcash/capture", post(checkout::gcash_capture))
        .route("/gcash/cancel", post(checkout::gcash_cancel))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/orders", get(orders::history))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
}
