//! Integration tests for the Shopify order webhook.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use rebuild_together_integration_tests::{TestApp, WEBHOOK_SECRET, paid_order};
use rebuild_together_server::testing::project;

fn app() -> TestApp {
    TestApp::builder()
        .projects(vec![project("Roof Repair Fund", "roof-repair", "7001")])
        .build()
}

// ============================================================================
// Donation recording
// ============================================================================

#[tokio::test]
async fn test_paid_order_records_donation_donor_and_receipt() {
    let app = app();

    let (status, body) = app
        .webhook(&paid_order(5_550_001, 7001, 4, "12.50"), Some(WEBHOOK_SECRET))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Webhook processed successfully");
    assert_eq!(body["donations_created"], 1);
    assert_eq!(body["receipts_generated"], 1);

    assert_eq!(app.auth.user_count(), 1);
    assert_eq!(app.store.profile_count(), 1);

    let donations = app.store.donations.lock().unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0].amount, Decimal::new(5000, 2));
    assert!(donations[0].receipt_url.is_some());
}

#[tokio::test]
async fn test_redelivered_webhook_creates_one_donation() {
    let app = app();
    let order = paid_order(5_550_002, 7001, 1, "25.00");

    let (first, _) = app.webhook(&order, Some(WEBHOOK_SECRET)).await;
    let (second, body) = app.webhook(&order, Some(WEBHOOK_SECRET)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["donations_created"], 0);
    assert_eq!(body["duplicates_skipped"], 1);
    assert_eq!(app.store.donation_count(), 1);
    assert_eq!(app.auth.user_count(), 1);
}

#[tokio::test]
async fn test_unknown_product_is_acknowledged_without_rows() {
    let app = app();

    let (status, body) = app
        .webhook(&paid_order(5_550_003, 9999, 1, "25.00"), Some(WEBHOOK_SECRET))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donations_created"], 0);
    assert_eq!(body["unmatched_products"], 1);
    assert_eq!(app.store.donation_count(), 0);
}

#[tokio::test]
async fn test_unpaid_order_is_skipped() {
    let app = app();
    let mut order = paid_order(5_550_004, 7001, 1, "25.00");
    order["financial_status"] = json!("pending");

    let (status, body) = app.webhook(&order, Some(WEBHOOK_SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order not paid, skipping");
    assert_eq!(app.store.donation_count(), 0);
    assert_eq!(app.auth.user_count(), 0);
}

#[tokio::test]
async fn test_order_without_email_is_skipped() {
    let app = app();
    let mut order = paid_order(5_550_005, 7001, 1, "25.00");
    order["email"] = json!(null);
    order["customer"] = json!(null);

    let (status, body) = app.webhook(&order, Some(WEBHOOK_SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User not found or created, skipping");
    assert_eq!(app.store.donation_count(), 0);
}

// ============================================================================
// Signature and payload validation
// ============================================================================

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let app = app();

    let (status, body) = app
        .webhook(&paid_order(5_550_006, 7001, 1, "25.00"), Some("wrong-secret"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid signature");
    assert_eq!(app.store.donation_count(), 0);
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let app = app();

    let (status, _) = app
        .webhook(&paid_order(5_550_007, 7001, 1, "25.00"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsigned_webhook_accepted_without_secret() {
    let app = TestApp::builder()
        .projects(vec![project("Roof Repair Fund", "roof-repair", "7001")])
        .without_webhook_secret()
        .build();

    let (status, body) = app
        .webhook(&paid_order(5_550_008, 7001, 1, "25.00"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donations_created"], 1);
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let app = app();

    let (status, _) = app
        .webhook(&json!({ "name": "#1001" }), Some(WEBHOOK_SECRET))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_functions_alias_routes_to_webhook() {
    let app = app();

    let (status, body) = app
        .post_json(
            "/functions/v1/shopify-webhook",
            None,
            &paid_order(5_550_009, 7001, 1, "25.00"),
        )
        .await;

    // Same handler, so the missing signature is rejected the same way.
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid signature");
}
