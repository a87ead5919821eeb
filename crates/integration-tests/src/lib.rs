//! End-to-end tests for the Rebuild Together donation server.
//!
//! Requests go through the full router and middleware stack in process.
//! The donation store, Supabase Auth and Supabase Storage are the in-memory
//! backends from `rebuild_together_server::testing`; the Shopify Storefront
//! API is a `wiremock` server when a test needs one. No database or network
//! service is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rebuild-together-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use url::Url;

use rebuild_together_core::{DonorId, UserRole};
use rebuild_together_server::app;
use rebuild_together_server::config::{ReceiptConfig, ServerConfig, ShopifyConfig, SupabaseConfig};
use rebuild_together_server::models::Project;
use rebuild_together_server::shopify::StorefrontClient;
use rebuild_together_server::shopify::webhook::{HMAC_HEADER, sign};
use rebuild_together_server::state::{AppState, Backends};
use rebuild_together_server::testing::{MemoryAuth, MemoryObjects, MemoryStore};

/// Service role key accepted by the receipt functions.
pub const SERVICE_KEY: &str = "test-service-role-key";

/// Shopify webhook signing secret.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Path the Storefront client posts GraphQL to.
pub const GRAPHQL_PATH: &str = "/api/2025-01/graphql.json";

/// Server configuration pointing at nothing real.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/rebuild_together_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        supabase: SupabaseConfig {
            url: "http://supabase.test".to_string(),
            service_role_key: SecretString::from(SERVICE_KEY),
        },
        shopify: ShopifyConfig {
            store: "rebuild-together.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_token: "public-token".to_string(),
            webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
        },
        receipts: ReceiptConfig::default(),
        cors_allowed_origin: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A router wired to in-memory backends, with handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
    pub objects: Arc<MemoryObjects>,
}

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    config: ServerConfig,
    projects: Vec<Project>,
    storefront: Option<Url>,
}

impl TestAppBuilder {
    /// Seed the store with projects.
    #[must_use]
    pub fn projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    /// Accept unsigned webhooks.
    #[must_use]
    pub fn without_webhook_secret(mut self) -> Self {
        self.config.shopify.webhook_secret = None;
        self
    }

    /// Send Storefront API calls to a mock server.
    #[must_use]
    pub fn storefront(mut self, base: &str) -> Self {
        self.storefront = Some(Url::parse(&format!("{base}{GRAPHQL_PATH}")).unwrap());
        self
    }

    #[must_use]
    pub fn build(self) -> TestApp {
        let store = Arc::new(MemoryStore::with_projects(self.projects));
        let auth = Arc::new(MemoryAuth::default());
        let objects = Arc::new(MemoryObjects::default());

        // Never connected: every handler under test goes through the backends.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/rebuild_together_test")
            .unwrap();

        let endpoint = self
            .storefront
            .unwrap_or_else(|| Url::parse("http://127.0.0.1:9/graphql.json").unwrap());
        let storefront = StorefrontClient::with_endpoint(endpoint, "public-token").unwrap();

        let backends = Backends {
            store: store.clone(),
            auth: auth.clone(),
            objects: objects.clone(),
        };
        let state = AppState::with_backends(self.config, pool, storefront, backends);

        TestApp {
            router: app(state),
            store,
            auth,
            objects,
        }
    }
}

impl TestApp {
    #[must_use]
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            config: test_config(),
            projects: Vec::new(),
            storefront: None,
        }
    }

    /// Sign in a user and return their id. With `admin`, also grant the
    /// admin role.
    pub fn sign_in(&self, token: &str, email: &str, admin: bool) -> DonorId {
        let id = self.auth.sign_in(token, email);
        if admin {
            self.store.grant(id, UserRole::Admin);
        }
        id
    }

    /// Send a request and return the status and JSON body (`Null` when the
    /// body is empty or not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// `GET` with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, Body::empty()))
            .await
    }

    /// `POST` a JSON body with an optional bearer token.
    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> (StatusCode, Value) {
        let mut req = request(Method::POST, uri, token, Body::from(body.to_string()));
        req.headers_mut()
            .insert("content-type", "application/json".parse().unwrap());
        self.send(req).await
    }

    /// Deliver an order webhook, signed with `secret` when given.
    pub async fn webhook(&self, order: &Value, secret: Option<&str>) -> (StatusCode, Value) {
        let body = order.to_string();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/webhooks/shopify/orders-paid")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            let signature = sign(&SecretString::from(secret), body.as_bytes());
            builder = builder.header(HMAC_HEADER, signature);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

/// A paid order buying `quantity` units at `price` of `product_id`.
#[must_use]
pub fn paid_order(order_id: u64, product_id: u64, quantity: u32, price: &str) -> Value {
    serde_json::json!({
        "id": order_id,
        "name": format!("#{}", order_id % 10_000),
        "email": "jane@example.org",
        "financial_status": "paid",
        "customer": { "first_name": "Jane", "last_name": "Donor" },
        "line_items": [
            { "product_id": product_id, "title": "Donation", "quantity": quantity, "price": price }
        ]
    })
}
