//! CRUD over the project page content tables.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use rebuild_together_core::ContentItemId;

use crate::db::ContentRepository;
use crate::db::content::ContentFields;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ContentItem, ContentKind};
use crate::state::AppState;

fn parse_kind(kind: &str) -> Result<ContentKind> {
    kind.parse()
        .map_err(|_| AppError::NotFound(format!("Unknown content kind: {kind}")))
}

/// Pick the kind's columns out of a JSON body.
///
/// On create, absent and `null` values are skipped and required columns
/// must be non-empty. On update, `null` clears nullable columns only.
fn content_fields(
    kind: ContentKind,
    body: &Map<String, Value>,
    creating: bool,
) -> Result<ContentFields> {
    let mut fields = ContentFields::new();

    for &column in kind.columns() {
        let required = kind.required().contains(&column);
        match body.get(column) {
            None | Some(Value::Null) if creating => {
                if required {
                    return Err(AppError::BadRequest(format!(
                        "Missing required field: {column}"
                    )));
                }
            }
            None => {}
            Some(Value::Null) => {
                if !kind.nullable().contains(&column) {
                    return Err(AppError::BadRequest(format!("{column} cannot be null")));
                }
                fields.push((column, None));
            }
            Some(Value::String(value)) => {
                if required && value.trim().is_empty() {
                    return Err(AppError::BadRequest(format!("{column} cannot be empty")));
                }
                fields.push((column, Some(value.clone())));
            }
            Some(_) => {
                return Err(AppError::BadRequest(format!("{column} must be a string")));
            }
        }
    }

    Ok(fields)
}

#[derive(Debug, Deserialize)]
pub struct HandleQuery {
    pub handle: Option<String>,
}

/// `GET /api/admin/content/{kind}?handle=`
#[instrument(skip(_admin, state))]
pub async fn list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<HandleQuery>,
) -> Result<Json<Vec<ContentItem>>> {
    let kind = parse_kind(&kind)?;
    let handle = query.handle.filter(|h| !h.is_empty());
    let rows = ContentRepository::new(state.pool())
        .list(kind, handle.as_deref())
        .await?;
    Ok(Json(rows))
}

/// `POST /api/admin/content/{kind}`
///
/// The row is appended after the handle's existing rows.
#[instrument(skip(_admin, state, body))]
pub async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<ContentItem>)> {
    let kind = parse_kind(&kind)?;
    let handle = body
        .get("shopify_product_handle")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Missing required field: shopify_product_handle".to_string())
        })?;
    let fields = content_fields(kind, &body, true)?;

    let row = ContentRepository::new(state.pool())
        .create(kind, handle, &fields)
        .await?;
    tracing::info!(kind = kind.as_str(), handle, "Content row created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /api/admin/content/{kind}/{id}`
#[instrument(skip(_admin, state, body))]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, ContentItemId)>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<ContentItem>> {
    let kind = parse_kind(&kind)?;
    let fields = content_fields(kind, &body, false)?;
    let display_order = match body.get("display_order") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| AppError::BadRequest("display_order must be an integer".to_string()))?,
        ),
    };
    if fields.is_empty() && display_order.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let row = ContentRepository::new(state.pool())
        .update(kind, id, &fields, display_order)
        .await?;
    Ok(Json(row))
}

/// `DELETE /api/admin/content/{kind}/{id}`
#[instrument(skip(_admin, state))]
pub async fn delete(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, ContentItemId)>,
) -> Result<StatusCode> {
    let kind = parse_kind(&kind)?;
    ContentRepository::new(state.pool()).delete(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_create_requires_required_columns() {
        let err = content_fields(ContentKind::Team, &body(json!({"role": "Lead"})), true);
        assert!(matches!(err, Err(AppError::BadRequest(m)) if m.contains("name")));
    }

    #[test]
    fn test_create_skips_nulls_and_unknown_keys() {
        let fields = content_fields(
            ContentKind::Partners,
            &body(json!({"name": "Acme", "logo_url": null, "evil; DROP": "x"})),
            true,
        )
        .unwrap();
        assert_eq!(fields, vec![("name", Some("Acme".to_string()))]);
    }

    #[test]
    fn test_update_null_clears_nullable_only() {
        let fields =
            content_fields(ContentKind::Team, &body(json!({"image_url": null})), false).unwrap();
        assert_eq!(fields, vec![("image_url", None)]);

        let err = content_fields(ContentKind::Impact, &body(json!({"text": null})), false);
        assert!(err.is_err());
    }

    #[test]
    fn test_non_string_rejected() {
        let err = content_fields(ContentKind::Gallery, &body(json!({"image_url": 3})), true);
        assert!(matches!(err, Err(AppError::BadRequest(m)) if m.contains("must be a string")));
    }

    #[test]
    fn test_unknown_kind_is_not_found() {
        assert!(matches!(parse_kind("videos"), Err(AppError::NotFound(_))));
    }
}
