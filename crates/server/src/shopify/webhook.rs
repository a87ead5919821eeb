//! Shopify `orders/paid` webhook payload and signature verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use rebuild_together_core::{FinancialStatus, MoneyError, parse_amount};

/// Header carrying the base64 HMAC of the raw body.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

type HmacSha256 = Hmac<Sha256>;

/// Webhook signature failures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// No signature header on the request.
    #[error("missing {HMAC_HEADER} header")]
    Missing,

    /// The header is not valid base64.
    #[error("signature is not valid base64")]
    Malformed,

    /// The signature does not match the body.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a webhook body against its `x-shopify-hmac-sha256` header.
///
/// The comparison is constant-time.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the header is absent, undecodable, or
/// does not match.
pub fn verify_signature(
    secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = STANDARD
        .decode(signature)
        .map_err(|_| SignatureError::Malformed)?;

    // HMAC accepts keys of any length
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return Err(SignatureError::Mismatch);
    };
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the header value Shopify would send for a body.
#[must_use]
pub fn sign(secret: &SecretString, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

// =============================================================================
// Payload
// =============================================================================

/// The subset of a Shopify order the donation pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    /// Numeric order id.
    pub id: u64,
    /// Display name, e.g. `#1001`.
    #[serde(default)]
    pub name: String,
    /// Order contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Order total.
    #[serde(default)]
    pub total_price: Option<String>,
    /// Purchased lines.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Customer record, absent for some guest checkouts.
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Order creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Payment state.
    #[serde(default)]
    pub financial_status: FinancialStatus,
}

/// One purchased line.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// Numeric product id; null for custom line items.
    #[serde(default)]
    pub product_id: Option<u64>,
    /// Numeric variant id.
    #[serde(default)]
    pub variant_id: Option<u64>,
    /// Line title.
    #[serde(default)]
    pub title: String,
    /// Quantity purchased.
    pub quantity: u32,
    /// Unit price.
    pub price: String,
}

/// Customer fields on an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Customer {
    /// Numeric customer id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl ShopifyOrder {
    /// The order id as stored in `donations.shopify_order_id`.
    #[must_use]
    pub fn order_id(&self) -> String {
        self.id.to_string()
    }

    /// Donor email: the order email, else the customer's.
    #[must_use]
    pub fn donor_email(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().map(str::trim).filter(|e| !e.is_empty())
        }
        non_empty(&self.email).or_else(|| self.customer.as_ref().and_then(|c| non_empty(&c.email)))
    }

    /// `"{first} {last}"` trimmed; `None` when both are blank.
    #[must_use]
    pub fn customer_name(&self) -> Option<String> {
        let customer = self.customer.as_ref()?;
        let name = format!(
            "{} {}",
            customer.first_name.as_deref().unwrap_or_default(),
            customer.last_name.as_deref().unwrap_or_default()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl LineItem {
    /// `price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the price isn't a decimal.
    pub fn amount(&self) -> Result<Decimal, MoneyError> {
        Ok(parse_amount(&self.price)? * Decimal::from(self.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("whsec-Tq93nLx0Vb")
    }

    #[test]
    fn test_verify_signature_roundtrip() {
        let body = br#"{"id":1}"#;
        let header = sign(&secret(), body);
        assert!(verify_signature(&secret(), body, Some(&header)).is_ok());
    }

    #[test]
    fn test_verify_signature_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let header = "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=";
        let key = SecretString::from("key");
        assert!(
            verify_signature(
                &key,
                b"The quick brown fox jumps over the lazy dog",
                Some(header)
            )
            .is_ok()
        );
    }

    #[test]
    fn test_verify_signature_failures() {
        let body = br#"{"id":1}"#;
        assert!(matches!(
            verify_signature(&secret(), body, None),
            Err(SignatureError::Missing)
        ));
        assert!(matches!(
            verify_signature(&secret(), body, Some("not base64!!")),
            Err(SignatureError::Malformed)
        ));
        let other = sign(&SecretString::from("another-secret"), body);
        assert!(matches!(
            verify_signature(&secret(), body, Some(&other)),
            Err(SignatureError::Mismatch)
        ));
        let tampered = sign(&secret(), br#"{"id":2}"#);
        assert!(matches!(
            verify_signature(&secret(), body, Some(&tampered)),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn test_order_payload_parses() {
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 5_123_456_789_u64,
            "name": "#1001",
            "email": "",
            "total_price": "50.00",
            "financial_status": "paid",
            "created_at": "2024-05-01T10:00:00-04:00",
            "customer": { "id": 77, "email": "Donor@Example.org", "first_name": "Ada", "last_name": null },
            "line_items": [
                { "product_id": 8_123_456_789_u64, "variant_id": 1, "title": "Roof", "quantity": 2500, "price": "0.01" },
                { "product_id": null, "title": "Tip", "quantity": 1, "price": "5.00" }
            ]
        }))
        .unwrap();

        assert!(order.financial_status.is_paid());
        assert_eq!(order.order_id(), "5123456789");
        assert_eq!(order.donor_email(), Some("Donor@Example.org"));
        assert_eq!(order.customer_name().as_deref(), Some("Ada"));
        assert_eq!(order.line_items[0].amount().unwrap(), Decimal::new(25, 0));
        assert!(order.line_items[1].product_id.is_none());
        assert_eq!(
            order.created_at.unwrap().to_rfc3339(),
            "2024-05-01T14:00:00+00:00"
        );
    }

    #[test]
    fn test_customer_name_blank_is_none() {
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 1,
            "email": "a@b.org",
            "financial_status": "pending",
            "customer": { "first_name": " ", "last_name": "" }
        }))
        .unwrap();
        assert!(order.customer_name().is_none());
        assert!(!order.financial_status.is_paid());
        assert_eq!(order.donor_email(), Some("a@b.org"));
    }

    #[test]
    fn test_donor_email_falls_back_to_customer() {
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 2,
            "email": "  ",
            "customer": { "email": " guest@example.org " }
        }))
        .unwrap();
        assert_eq!(order.donor_email(), Some("guest@example.org"));

        let order: ShopifyOrder =
            serde_json::from_value(serde_json::json!({ "id": 3, "customer": null })).unwrap();
        assert_eq!(order.donor_email(), None);
    }
}
