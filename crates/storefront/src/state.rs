//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::ActiveCarts;
use crate::checkout::OrderSubmission;
use crate::config::StorefrontConfig;
use crate::db::PgCartRepository;
use crate::docstore::DocStoreClient;
use crate::identity::{IdentityClient, IdentityEvents};
use crate::payments::{GcashClient, MockPaymentClient};
use crate::services::ReceiptClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    docstore: DocStoreClient,
    identity: IdentityClient,
    events: IdentityEvents,
    carts: ActiveCarts<PgCartRepository>,
    submission: OrderSubmission<PgCartRepository, DocStoreClient>,
    card: MockPaymentClient,
    gcash: GcashClient,
}

impl AppState {
    /// Create a new application state, wiring clients from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let docstore = DocStoreClient::new(&config.docstore);
        let identity = IdentityClient::new(&config.identity);
        let card = MockPaymentClient::new(&config.mock_payment);
        let gcash = GcashClient::new(&config.gcash);

        let carts = ActiveCarts::new(PgCartRepository::new(pool.clone()));

        let receipts = ReceiptClient::new(
            config.email_receipts.clone(),
            config.sms_receipts.clone(),
        );
        let receipts = receipts.is_configured().then_some(receipts);

        let submission = OrderSubmission::new(carts.clone(), docstore.clone(), receipts);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                docstore,
                identity,
                events: IdentityEvents::new(),
                carts,
                submission,
                card,
                gcash,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the document store client.
    #[must_use]
    pub fn docstore(&self) -> &DocStoreClient {
        &self.inner.docstore
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the identity event broadcast.
    #[must_use]
    pub fn events(&self) -> &IdentityEvents {
        &self.inner.events
    }

    /// Get a reference to the live cart registry.
    #[must_use]
    pub fn carts(&self) -> &ActiveCarts<PgCartRepository> {
        &self.inner.carts
    }

    /// Get a reference to the order submission coordinator.
    #[must_use]
    pub fn submission(&self) -> &OrderSubmission<PgCartRepository, DocStoreClient> {
        &self.inner.submission
    }

    /// Get a reference to the mock card payment client.
    #[must_use]
    pub fn card(&self) -> &MockPaymentClient {
        &self.inner.card
    }

    /// Get a reference to the GCash payment client.
    #[must_use]
    pub fn gcash(&self) -> &GcashClient {
        &self.inner.gcash
    }
}
