//! Supabase Auth admin operations.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rebuild_together_core::{DonorId, Email};

use super::{SupabaseClient, SupabaseError, api_error};

/// Users fetched per admin list page.
const USERS_PER_PAGE: usize = 1000;

/// Upper bound on pages scanned when looking a user up by email.
const MAX_USER_PAGES: u32 = 50;

/// An auth user as returned by Supabase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    /// Auth user id (shared with the donor profile).
    pub id: DonorId,
    /// Email on the auth record, if any.
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    /// Whether this user's email matches (case-insensitive).
    #[must_use]
    pub fn has_email(&self, email: &Email) -> bool {
        self.email
            .as_deref()
            .is_some_and(|e| e.trim().eq_ignore_ascii_case(email.as_str()))
    }
}

/// Identity lookups the order pipeline and admin gate depend on.
#[async_trait]
pub trait AuthDirectory: Send + Sync {
    /// Find an auth user by email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError>;

    /// Create a confirmed auth user. If the email is already registered the
    /// existing user is returned instead.
    async fn create_user(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<AuthUser, SupabaseError>;

    /// Resolve a user access token; `None` when the token is invalid.
    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError>;
}

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    users: Vec<AuthUser>,
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct UserMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

impl SupabaseClient {
    async fn list_users_page(&self, page: u32) -> Result<Vec<AuthUser>, SupabaseError> {
        let mut url = self.endpoint("auth/v1/admin/users")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &USERS_PER_PAGE.to_string());

        let response = self.http().get(url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        let page: UserPage = serde_json::from_str(&text)?;
        Ok(page.users)
    }
}

#[async_trait]
impl AuthDirectory for SupabaseClient {
    #[instrument(skip_all, fields(email = %email))]
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError> {
        for page in 1..=MAX_USER_PAGES {
            let users = self.list_users_page(page).await?;
            let exhausted = users.len() < USERS_PER_PAGE;

            if let Some(user) = users.into_iter().find(|u| u.has_email(email)) {
                return Ok(Some(user));
            }
            if exhausted {
                return Ok(None);
            }
        }

        tracing::warn!(max_pages = MAX_USER_PAGES, "Stopped scanning auth users");
        Ok(None)
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn create_user(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<AuthUser, SupabaseError> {
        let body = CreateUserRequest {
            email: email.as_str(),
            email_confirm: true,
            user_metadata: UserMetadata { full_name },
        };

        let response = self
            .http()
            .post(self.endpoint("auth/v1/admin/users")?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            let user: AuthUser = serde_json::from_str(&text)?;
            tracing::info!(user_id = %user.id, "Created auth user");
            return Ok(user);
        }

        // Registered concurrently or before the profile existed.
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::info!("Auth user already exists, looking it up");
            return self
                .find_user_by_email(email)
                .await?
                .ok_or(SupabaseError::UserExists);
        }

        Err(api_error(response).await)
    }

    #[instrument(skip_all)]
    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let response = self
            .http()
            .get(self.endpoint("auth/v1/user")?)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let text = response.text().await?;
                Ok(Some(serde_json::from_str(&text)?))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(api_error(response).await),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::SupabaseConfig;

    const KEY: &str = "svc-role-k3y-Zq81";

    fn client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: server.uri(),
            service_role_key: SecretString::from(KEY),
        })
        .unwrap()
    }

    fn user_json(id: &str, email: &str) -> serde_json::Value {
        serde_json::json!({ "id": id, "email": email, "aud": "authenticated" })
    }

    #[tokio::test]
    async fn test_find_user_by_email_matches_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .and(query_param("page", "1"))
            .and(header("apikey", KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [
                    user_json("8d0f0e4e-3f5e-4bde-9a55-5f0e2d7c1a01", "other@example.org"),
                    user_json("1f6a2c2e-7a1b-4f0e-8a0a-2b9c3d4e5f60", "Jane@Example.org"),
                ]
            })))
            .mount(&server)
            .await;

        let email = Email::parse("jane@example.org").unwrap();
        let user = client(&server).find_user_by_email(&email).await.unwrap().unwrap();
        assert_eq!(user.id.to_string(), "1f6a2c2e-7a1b-4f0e-8a0a-2b9c3d4e5f60");
    }

    #[tokio::test]
    async fn test_find_user_by_email_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"users": []})))
            .mount(&server)
            .await;

        let email = Email::parse("nobody@example.org").unwrap();
        assert!(client(&server).find_user_by_email(&email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_user_sends_confirmed_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(body_partial_json(serde_json::json!({
                "email": "new@example.org",
                "email_confirm": true,
                "user_metadata": { "full_name": "New Donor" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(
                "0b7f7b9e-2d7e-4c55-bb4a-7c1d1e2f3a4b",
                "new@example.org",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let email = Email::parse("new@example.org").unwrap();
        let user = client(&server)
            .create_user(&email, Some("New Donor"))
            .await
            .unwrap();
        assert!(user.has_email(&email));
    }

    #[tokio::test]
    async fn test_create_user_existing_falls_back_to_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "code": 422,
                "error_code": "email_exists",
                "msg": "A user with this email address has already been registered"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [user_json("5a5b5c5d-0000-4000-8000-000000000001", "dup@example.org")]
            })))
            .mount(&server)
            .await;

        let email = Email::parse("dup@example.org").unwrap();
        let user = client(&server).create_user(&email, None).await.unwrap();
        assert_eq!(user.id.to_string(), "5a5b5c5d-0000-4000-8000-000000000001");
    }

    #[tokio::test]
    async fn test_user_for_token_invalid_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer bad-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;

        assert!(client(&server).user_for_token("bad-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_for_token_valid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer good-token"))
            .and(header("apikey", KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(
                "7e7e7e7e-1111-4222-8333-944444444444",
                "admin@example.org",
            )))
            .mount(&server)
            .await;

        let user = client(&server).user_for_token("good-token").await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@example.org"));
    }
}
