//! Database operations for storefront `PostgreSQL`.
//!
//! Stores session-adjacent local data only; orders and user profiles live in
//! the document store:
//!
//! ## Tables
//!
//! - `sessions` - Tower-sessions storage
//! - `cart_storage` - Identity-keyed persisted carts
//!
//! Migrations are stored in `crates/storefront/migrations/` and run at
//! startup via [`run_migrations`].

pub mod carts;

pub use carts::PgCartRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
