//! Postgres-backed cart persistence.
//!
//! One row per identity in `cart_storage`, keyed `cart_<identity>`, items
//! stored as a JSON array. Saves replace the whole row; the registry's
//! in-memory cart is authoritative, so last write wins.

use sqlx::PgPool;
use sqlx::types::JsonValue;
use tracing::instrument;

use wavecrest_core::IdentityId;

use crate::cart::persistence::{CartPersistence, PersistenceError};
use crate::cart::LineItem;

/// Cart persistence backed by the storefront database.
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_key(identity: &IdentityId) -> String {
    format!("cart_{identity}")
}

impl CartPersistence for PgCartRepository {
    #[instrument(skip(self, items))]
    async fn save(&self, identity: &IdentityId, items: &[LineItem]) -> Result<(), PersistenceError> {
        let payload =
            serde_json::to_value(items).map_err(|e| PersistenceError::Storage(e.to_string()))?;

        sqlx::query(
            "INSERT INTO cart_storage (storage_key, items, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (storage_key)
             DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()",
        )
        .bind(storage_key(identity))
        .bind(&payload)
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self, identity: &IdentityId) -> Result<Vec<LineItem>, PersistenceError> {
        let row: Option<(JsonValue,)> =
            sqlx::query_as("SELECT items FROM cart_storage WHERE storage_key = $1")
                .bind(storage_key(identity))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        match row {
            Some((items,)) => serde_json::from_value(items)
                .map_err(|e| PersistenceError::Corrupt(e.to_string())),
            None => Ok(Vec::new()),
        }
    }
}
