//! Integration tests for receipt generation.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use rebuild_together_integration_tests::{SERVICE_KEY, TestApp, WEBHOOK_SECRET, paid_order};
use rebuild_together_server::testing::project;

fn stored_pdf(app: &TestApp, key: &str) -> Vec<u8> {
    app.objects
        .objects
        .lock()
        .unwrap()
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, bytes)| bytes.clone())
        .unwrap()
}

fn pdf_text(bytes: &[u8]) -> String {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    assert!(!pages.is_empty());
    doc.extract_text(&pages).unwrap()
}

#[tokio::test]
async fn test_generate_receipt_uploads_valid_pdf() {
    let app = TestApp::builder().build();

    let (status, body) = app
        .post_json(
            "/functions/v1/generate-receipt",
            Some(SERVICE_KEY),
            &json!({
                "donation_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "order_id": "5550001",
                "order_name": "#1001",
                "amount": "25.00",
                "donor_email": "jane@example.org",
                "donor_name": "Jane Donor",
                "project_title": "Roof Repair Fund",
                "date": "2024-05-01"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let path = body["receipt_path"].as_str().unwrap();
    assert!(path.starts_with("receipts/3fa85f64-5717-4562-b3fc-2c963f66afa6-"));
    assert!(body["receipt_url"].as_str().unwrap().contains("/sign/receipts/"));

    let bytes = stored_pdf(&app, &format!("receipts/{path}"));
    assert!(bytes.starts_with(b"%PDF-"));
    let text = pdf_text(&bytes);
    assert!(text.contains("Roof Repair Fund"));
    assert!(text.contains("Jane Donor"));
}

#[tokio::test]
async fn test_generate_receipt_rejects_missing_fields() {
    let app = TestApp::builder().build();

    let (status, body) = app
        .post_json(
            "/functions/v1/generate-receipt",
            Some(SERVICE_KEY),
            &json!({ "donation_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: order_id");
    assert!(app.objects.paths().is_empty());
}

#[tokio::test]
async fn test_annual_receipts_after_webhook_donations() {
    let app = TestApp::builder()
        .projects(vec![
            project("Roof Repair Fund", "roof-repair", "7001"),
            project("Ramp Builds", "ramp-builds", "7002"),
        ])
        .build();

    app.webhook(&paid_order(5_550_001, 7001, 1, "25.00"), Some(WEBHOOK_SECRET))
        .await;
    app.webhook(&paid_order(5_550_002, 7002, 2, "10.00"), Some(WEBHOOK_SECRET))
        .await;
    assert_eq!(app.store.donation_count(), 2);

    let (status, body) = app
        .post_json(
            "/functions/v1/generate-annual-receipts",
            Some(SERVICE_KEY),
            &json!({}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let year = body["year"].as_i64().unwrap();
    let donor_id = body["results"][0]["donor_id"].as_str().unwrap().to_string();
    assert!(
        body["results"][0]["pdf_url"]
            .as_str()
            .unwrap()
            .contains(&format!("annual/{donor_id}-{year}.pdf"))
    );

    let bytes = stored_pdf(&app, &format!("receipts/annual/{donor_id}-{year}.pdf"));
    let text = pdf_text(&bytes);
    assert!(text.contains("Roof Repair Fund"));
    assert!(text.contains("Ramp Builds"));

    // A second run replaces the stored summary instead of adding one.
    let (status, _) = app
        .post_json(
            "/functions/v1/generate-annual-receipts",
            Some(SERVICE_KEY),
            &json!({ "year": year }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.tax_receipts.lock().unwrap().len(), 1);
}
