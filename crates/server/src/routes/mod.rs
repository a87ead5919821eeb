//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Database readiness
//!
//! # Shopify webhook
//! POST /webhooks/shopify/orders-paid            - Paid order (HMAC verified)
//! POST /functions/v1/shopify-webhook            - Same handler
//!
//! # Functions
//! POST /functions/v1/generate-receipt           - Service role
//! POST /functions/v1/generate-annual-receipts   - Service role
//! POST /functions/v1/manual-order-process       - Admin
//! POST /functions/v1/admin-project-updates      - Admin
//!
//! # Catalog and cart
//! GET  /api/products                            - Product listing
//! GET  /api/products/{handle}                   - Product with donation variants
//! GET  /api/collections/{handle}                - Collection
//! GET  /api/cart?id=                            - Cart
//! POST /api/cart/add | update | remove          - Cart mutations
//!
//! # Public projects
//! GET  /api/projects                            - Project list
//! GET  /api/projects/{handle}                   - Project page
//!
//! # Donor dashboard (signed in)
//! GET  /api/me | PUT /api/me                    - Profile
//! GET  /api/me/donations                        - Donations
//! GET  /api/me/tax-receipts                     - Annual receipts
//!
//! # Admin
//! GET|POST       /api/admin/projects
//! PUT|DELETE     /api/admin/projects/{id}
//! GET|POST       /api/admin/content/{kind}
//! PUT|DELETE     /api/admin/content/{kind}/{id}
//! GET            /api/admin/diagnostics
//! GET            /api/admin/diagnostics/order
//! POST           /api/admin/cache/clear
//! ```

pub mod admin;
pub mod catalog;
pub mod functions;
pub mod me;
pub mod projects;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the `/functions/v1` routes.
pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/shopify-webhook", post(webhooks::orders_paid))
        .route("/generate-receipt", post(functions::generate_receipt))
        .route(
            "/generate-annual-receipts",
            post(functions::generate_annual_receipts),
        )
        .route("/manual-order-process", post(functions::manual_order_process))
        .route("/admin-project-updates", post(functions::admin_project_updates))
}

/// Create the catalog and cart routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{handle}", get(catalog::show_product))
        .route("/collections/{handle}", get(catalog::show_collection))
        .route("/cart", get(catalog::show_cart))
        .route("/cart/add", post(catalog::add_to_cart))
        .route("/cart/update", post(catalog::update_cart))
        .route("/cart/remove", post(catalog::remove_from_cart))
}

/// Create the donor dashboard routes.
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(me::profile).put(me::update_profile))
        .route("/donations", get(me::donations))
        .route("/tax-receipts", get(me::tax_receipts))
}

/// Create the admin routes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects",
            get(admin::projects::list).post(admin::projects::create),
        )
        .route(
            "/projects/{id}",
            put(admin::projects::update).delete(admin::projects::delete),
        )
        .route(
            "/content/{kind}",
            get(admin::content::list).post(admin::content::create),
        )
        .route(
            "/content/{kind}/{id}",
            put(admin::content::update).delete(admin::content::delete),
        )
        .route("/diagnostics", get(admin::diagnostics::overview))
        .route("/diagnostics/order", get(admin::diagnostics::order))
        .route("/cache/clear", post(admin::clear_cache))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/webhooks/shopify/orders-paid", post(webhooks::orders_paid))
        .nest("/functions/v1", function_routes())
        .nest("/api", catalog_routes())
        .route("/api/projects", get(projects::list))
        .route("/api/projects/{handle}", get(projects::show))
        .nest("/api/me", me_routes())
        .nest("/api/admin", admin_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
