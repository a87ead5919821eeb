//! Integration tests for authentication and the admin-only functions.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use rebuild_together_integration_tests::{SERVICE_KEY, TestApp};
use rebuild_together_server::testing::project;

fn app() -> TestApp {
    TestApp::builder()
        .projects(vec![project("Roof Repair Fund", "roof-repair", "7001")])
        .build()
}

// ============================================================================
// Admin gate
// ============================================================================

#[tokio::test]
async fn test_admin_route_requires_token() {
    let app = app();

    let (status, body) = app
        .post_json("/api/admin/cache/clear", None, &json!({}))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");
}

#[tokio::test]
async fn test_admin_route_rejects_unknown_token() {
    let app = app();

    let (status, body) = app
        .post_json("/api/admin/cache/clear", Some("stale-token"), &json!({}))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_admin_route_forbids_donors() {
    let app = app();
    app.sign_in("donor-token", "donor@example.org", false);

    let (status, body) = app
        .post_json("/api/admin/cache/clear", Some("donor-token"), &json!({}))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_admin_route_allows_admins() {
    let app = app();
    app.sign_in("admin-token", "admin@example.org", true);

    let (status, body) = app
        .post_json("/api/admin/cache/clear", Some("admin-token"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], "all");

    let (status, body) = app
        .post_json(
            "/api/admin/cache/clear?handle=roof-repair",
            Some("admin-token"),
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], "roof-repair");
}

#[tokio::test]
async fn test_donor_routes_require_token() {
    let app = app();

    let (status, _) = app.get("/api/me/donations", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Service role
// ============================================================================

#[tokio::test]
async fn test_receipt_functions_require_service_key() {
    let app = app();
    app.sign_in("admin-token", "admin@example.org", true);

    for uri in [
        "/functions/v1/generate-receipt",
        "/functions/v1/generate-annual-receipts",
    ] {
        let (status, _) = app.post_json(uri, None, &json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} without token");

        let (status, body) = app.post_json(uri, Some("admin-token"), &json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} with user token");
        assert_eq!(body["error"], "Invalid service key");
    }
}

#[tokio::test]
async fn test_annual_receipts_with_no_donations() {
    let app = app();

    let (status, body) = app
        .post_json(
            "/functions/v1/generate-annual-receipts",
            Some(SERVICE_KEY),
            &json!({ "year": 2020 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No donations found for year");
}

#[tokio::test]
async fn test_annual_receipts_rejects_out_of_range_year() {
    let app = app();

    let (status, body) = app
        .post_json(
            "/functions/v1/generate-annual-receipts",
            Some(SERVICE_KEY),
            &json!({ "year": 999_999 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid year: 999999");
    assert!(app.objects.paths().is_empty());
}

// ============================================================================
// Manual orders
// ============================================================================

fn manual_order() -> serde_json::Value {
    json!({
        "order_id": "offline-42",
        "email": "Check.Writer@Example.org",
        "product_handle": "roof-repair",
        "amount": "150.00"
    })
}

#[tokio::test]
async fn test_manual_order_requires_admin() {
    let app = app();
    app.sign_in("donor-token", "donor@example.org", false);

    let (status, _) = app
        .post_json(
            "/functions/v1/manual-order-process",
            Some("donor-token"),
            &manual_order(),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.donation_count(), 0);
}

#[tokio::test]
async fn test_manual_order_creates_then_reports_existing() {
    let app = app();
    app.sign_in("admin-token", "admin@example.org", true);

    let (status, body) = app
        .post_json(
            "/functions/v1/manual-order-process",
            Some("admin-token"),
            &manual_order(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order processed successfully");
    assert_eq!(body["donation"]["project_title"], "Roof Repair Fund");
    assert_eq!(body["user"]["email"], "check.writer@example.org");
    let donation_id = body["donation"]["id"].clone();

    let (status, body) = app
        .post_json(
            "/functions/v1/manual-order-process",
            Some("admin-token"),
            &manual_order(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Donation already exists");
    assert_eq!(body["donation_id"], donation_id);
    assert_eq!(app.store.donation_count(), 1);
}

#[tokio::test]
async fn test_manual_order_validation() {
    let app = app();
    app.sign_in("admin-token", "admin@example.org", true);

    let mut missing = manual_order();
    missing["email"] = json!("");
    let (status, body) = app
        .post_json("/functions/v1/manual-order-process", Some("admin-token"), &missing)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: email");

    let mut unknown = manual_order();
    unknown["product_handle"] = json!("no-such-project");
    let (status, body) = app
        .post_json("/functions/v1/manual-order-process", Some("admin-token"), &unknown)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");
}
