//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{DonationStore, PgStore};
use crate::services::{AnnualReceiptService, OrderProcessor, ReceiptService};
use crate::shopify::{ShopifyError, StorefrontClient};
use crate::supabase::{AuthDirectory, ObjectStore, SupabaseClient, SupabaseError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("supabase client: {0}")]
    Supabase(#[from] SupabaseError),
}

/// External backends the services run against.
///
/// Production wires these to `PostgreSQL` and Supabase; tests substitute
/// in-memory implementations.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DonationStore>,
    pub auth: Arc<dyn AuthDirectory>,
    pub objects: Arc<dyn ObjectStore>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    storefront: StorefrontClient,
    backends: Backends,
    orders: OrderProcessor,
    receipts: ReceiptService,
    annual: AnnualReceiptService,
}

impl AppState {
    /// Create the production application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify or Supabase client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        let supabase = Arc::new(SupabaseClient::new(&config.supabase)?);
        let backends = Backends {
            store: Arc::new(PgStore::new(pool.clone())),
            auth: supabase.clone(),
            objects: supabase,
        };
        Ok(Self::with_backends(config, pool, storefront, backends))
    }

    /// Create state over explicit backends.
    #[must_use]
    pub fn with_backends(
        config: ServerConfig,
        pool: PgPool,
        storefront: StorefrontClient,
        backends: Backends,
    ) -> Self {
        let receipts = ReceiptService::new(backends.objects.clone(), config.receipts.clone());
        let annual = AnnualReceiptService::new(
            backends.store.clone(),
            backends.objects.clone(),
            config.receipts.clone(),
        );
        let orders = OrderProcessor::new(
            backends.store.clone(),
            backends.auth.clone(),
            receipts.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storefront,
                backends,
                orders,
                receipts,
                annual,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Donation persistence seam.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DonationStore> {
        &self.inner.backends.store
    }

    /// Supabase Auth seam.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthDirectory> {
        &self.inner.backends.auth
    }

    /// Paid-order and manual order processing.
    #[must_use]
    pub fn orders(&self) -> &OrderProcessor {
        &self.inner.orders
    }

    /// Single-donation receipts.
    #[must_use]
    pub fn receipts(&self) -> &ReceiptService {
        &self.inner.receipts
    }

    /// Annual tax summaries.
    #[must_use]
    pub fn annual_receipts(&self) -> &AnnualReceiptService {
        &self.inner.annual
    }
}
