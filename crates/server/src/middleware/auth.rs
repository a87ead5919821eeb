//! Authentication extractors.
//!
//! All three read `Authorization: Bearer <token>`:
//!
//! - [`RequireDonor`] - a valid Supabase user access token
//! - [`RequireAdmin`] - a donor holding the `admin` role
//! - [`RequireServiceRole`] - the Supabase service role key, used by
//!   server-to-server receipt calls

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use rebuild_together_core::UserRole;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;
use crate::supabase::AuthUser;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireDonor(user): RequireDonor) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireDonor(pub AuthUser);

/// Extractor that requires a signed-in admin.
///
/// Missing or invalid tokens are rejected with 401, non-admins with 403.
pub struct RequireAdmin(pub AuthUser);

/// Extractor that requires the service role key as bearer token.
pub struct RequireServiceRole;

/// Token from an `Authorization: Bearer` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl FromRequestParts<AppState> for RequireDonor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let user = state
            .auth()
            .user_for_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        set_sentry_user(&user.id, user.email.as_deref());
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireDonor(user) = RequireDonor::from_request_parts(parts, state).await?;

        if !state.store().has_role(user.id, UserRole::Admin).await? {
            tracing::warn!(user_id = %user.id, "Admin access denied");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireServiceRole {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let expected = state.config().supabase.service_role_key.expose_secret();
        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            return Err(AppError::Unauthorized("Invalid service key".to_string()));
        }

        Ok(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }
}
