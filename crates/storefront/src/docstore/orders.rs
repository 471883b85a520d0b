//! Order documents.
//!
//! [`OrderStore`] is the seam order submission writes through, so checkout
//! logic can be exercised against an in-memory store in tests. The real
//! implementation keeps orders under `/orders`, queryable by owner.

use std::future::Future;

use serde::Deserialize;
use tracing::instrument;
use wavecrest_core::IdentityId;

use super::{DocStoreClient, DocStoreError, decode};
use crate::models::Order;

/// Persistent storage for orders.
pub trait OrderStore: Clone + Send + Sync + 'static {
    /// Write a new order document. Submission treats any error as "the order
    /// does not exist" and leaves the cart intact.
    fn create_order(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<(), DocStoreError>> + Send;

    /// All orders belonging to an identity, newest first.
    fn orders_for_owner(
        &self,
        owner: &IdentityId,
    ) -> impl Future<Output = Result<Vec<Order>, DocStoreError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OrderListResponse {
    #[serde(default)]
    orders: Vec<Order>,
}

impl OrderStore for DocStoreClient {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_order(&self, order: &Order) -> Result<(), DocStoreError> {
        let response = self.post("/orders").json(order).send().await?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let text = response.text().await?;
            return Err(DocStoreError::Api {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn orders_for_owner(&self, owner: &IdentityId) -> Result<Vec<Order>, DocStoreError> {
        let response = self
            .get("/orders")
            .query(&[("owner", owner.as_str())])
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let mut listed = match decode::<OrderListResponse>(status, &text) {
            Ok(listed) => listed.orders,
            Err(DocStoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}
