//! Supabase Auth admin and Storage clients.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the Supabase REST endpoints
//! - Every request carries the service role key as both `apikey` and bearer
//! - [`AuthDirectory`] and [`ObjectStore`] are the seams the order and
//!   receipt services depend on; [`SupabaseClient`] implements both
//!
//! # Endpoints
//!
//! - `GET/POST /auth/v1/admin/users` - list and create auth users
//! - `GET /auth/v1/user` - resolve a user access token
//! - `POST /storage/v1/object/{bucket}/{path}` - upload
//! - `POST /storage/v1/object/sign/{bucket}/{path}` - signed download URL

mod auth;
mod storage;

pub use auth::{AuthDirectory, AuthUser};
pub use storage::ObjectStore;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when calling Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase returned a non-success status.
    #[error("Supabase API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An auth user with this email already exists.
    #[error("User already exists")]
    UserExists,

    /// A URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured key is not a valid header value.
    #[error("Invalid service role key")]
    InvalidKey,
}

/// Client for the Supabase Auth admin and Storage APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Errors
    ///
    /// Returns an error if the project URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let key = config.service_role_key.expose_secret();
        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(key).map_err(|_| SupabaseError::InvalidKey)?;
        apikey.set_sensitive(true);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| SupabaseError::InvalidKey)?;
        bearer.set_sensitive(true);
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        // Trailing slash so `join` appends instead of replacing the last segment.
        let base_url = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url,
            }),
        })
    }

    /// Resolve a path relative to the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Project URL without trailing slash.
    fn base(&self) -> &str {
        self.inner.base_url.as_str().trim_end_matches('/')
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }
}

/// Turn a non-success response into [`SupabaseError::Api`].
async fn api_error(response: reqwest::Response) -> SupabaseError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body);

    tracing::warn!(
        status,
        body = %body.chars().take(500).collect::<String>(),
        "Supabase API returned non-success status"
    );

    SupabaseError::Api { status, message }
}

/// Pull a human-readable message out of a Supabase error body.
///
/// Auth uses `msg`/`error_description`, Storage uses `message`/`error`.
fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.chars().take(200).collect();
    };

    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map_or_else(|| body.chars().take(200).collect(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_variants() {
        assert_eq!(
            extract_error_message(r#"{"code":422,"msg":"A user with this email address has already been registered"}"#),
            "A user with this email address has already been registered"
        );
        assert_eq!(
            extract_error_message(r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#),
            "Object not found"
        );
        assert_eq!(extract_error_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_api_error_display() {
        let err = SupabaseError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Supabase API error (500): boom");
    }
}
