//! Admin console API. Every handler requires [`RequireAdmin`].

pub mod content;
pub mod diagnostics;
pub mod projects;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub handle: Option<String>,
}

/// `POST /api/admin/cache/clear?handle=`
///
/// Drops one cached product, or every cached catalog entry and cart.
#[instrument(skip(_admin, state))]
pub async fn clear_cache(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<Value>> {
    match query.handle.filter(|h| !h.is_empty()) {
        Some(handle) => {
            state.storefront().invalidate_product(&handle).await;
            Ok(Json(json!({ "cleared": handle })))
        }
        None => {
            state.storefront().invalidate_all().await;
            Ok(Json(json!({ "cleared": "all" })))
        }
    }
}
