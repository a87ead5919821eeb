//! Shopify order webhook.
//!
//! The body is read as raw bytes so the HMAC is computed over exactly what
//! Shopify signed, then parsed into a [`ShopifyOrder`].

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{WebhookOutcome, WebhookSummary};
use crate::shopify::webhook::{HMAC_HEADER, ShopifyOrder, verify_signature};
use crate::state::AppState;

#[derive(Serialize)]
struct Processed {
    message: &'static str,
    #[serde(flatten)]
    summary: WebhookSummary,
}

/// `POST /webhooks/shopify/orders-paid`
#[instrument(skip_all)]
pub async fn orders_paid(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    if let Some(secret) = &state.config().shopify.webhook_secret {
        let signature = headers.get(HMAC_HEADER).and_then(|v| v.to_str().ok());
        if let Err(e) = verify_signature(secret, &body, signature) {
            tracing::warn!(error = %e, "Webhook signature rejected");
            return Err(AppError::Unauthorized("Invalid signature".to_string()));
        }
    } else {
        tracing::warn!("SHOPIFY_WEBHOOK_SECRET not set, skipping signature verification");
    }

    let order: ShopifyOrder = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed webhook payload");
        AppError::BadRequest(format!("Invalid order payload: {e}"))
    })?;

    let order_id = order.order_id();
    add_breadcrumb(
        "webhook",
        "Order received",
        &[("order_id", &order_id), ("order_name", &order.name)],
    );

    let response = match state.orders().process_webhook(&order).await? {
        WebhookOutcome::NotPaid => json!({ "message": "Order not paid, skipping" }),
        WebhookOutcome::NoDonor => json!({ "message": "User not found or created, skipping" }),
        WebhookOutcome::Processed(summary) => serde_json::to_value(Processed {
            message: "Webhook processed successfully",
            summary,
        })
        .map_err(|e| AppError::Internal(e.to_string()))?,
    };

    Ok(Json(response))
}
