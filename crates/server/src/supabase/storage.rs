//! Supabase Storage operations.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{SupabaseClient, SupabaseError, api_error};

/// File storage used for receipt PDFs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object. With `upsert` an existing object is replaced,
    /// otherwise an existing path is an error.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), SupabaseError>;

    /// Create a time-limited download URL.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, SupabaseError>;

    /// Public URL of an object (only downloadable from public buckets).
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[derive(Debug, Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[async_trait]
impl ObjectStore for SupabaseClient {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), SupabaseError> {
        let response = self
            .http()
            .post(self.endpoint(&format!("storage/v1/object/{bucket}/{path}"))?)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, SupabaseError> {
        let response = self
            .http()
            .post(self.endpoint(&format!("storage/v1/object/sign/{bucket}/{path}"))?)
            .json(&SignRequest {
                expires_in: expires_in_secs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        let signed: SignResponse = serde_json::from_str(&text)?;

        // The returned path is relative to the storage API root.
        Ok(format!(
            "{}/storage/v1/{}",
            self.base(),
            signed.signed_url.trim_start_matches('/')
        ))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::SupabaseConfig;

    fn client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: server.uri(),
            service_role_key: SecretString::from("svc-role-k3y-Zq81"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_sets_upsert_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/receipts/receipts/abc-1.pdf"))
            .and(header("x-upsert", "false"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Key": "receipts/receipts/abc-1.pdf"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .upload(
                "receipts",
                "receipts/abc-1.pdf",
                b"%PDF-1.5".to_vec(),
                "application/pdf",
                false,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_conflict_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/receipts/receipts/abc-1.pdf"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .upload("receipts", "receipts/abc-1.pdf", vec![], "application/pdf", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_create_signed_url_prefixes_storage_root() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/receipts/annual/d-2024.pdf"))
            .and(body_json(serde_json::json!({ "expiresIn": 31_536_000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "signedURL": "/object/sign/receipts/annual/d-2024.pdf?token=t0k"
            })))
            .mount(&server)
            .await;

        let url = client(&server)
            .create_signed_url("receipts", "annual/d-2024.pdf", 31_536_000)
            .await
            .unwrap();
        assert_eq!(
            url,
            format!(
                "{}/storage/v1/object/sign/receipts/annual/d-2024.pdf?token=t0k",
                server.uri()
            )
        );
    }

    #[test]
    fn test_public_url() {
        let client = SupabaseClient::new(&SupabaseConfig {
            url: "https://abc.supabase.co/".to_string(),
            service_role_key: SecretString::from("svc-role-k3y-Zq81"),
        })
        .unwrap();
        assert_eq!(
            client.public_url("receipts", "receipts/x.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/receipts/receipts/x.pdf"
        );
    }
}
