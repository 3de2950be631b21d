use std::sync::Arc;

use axum::extract::{rejection::JsonRejection, Extension, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::ResourceController;
use crate::types::{Caller, Row};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring matched against the resource's search fields
    pub search: Option<String>,
}

/// GET /api/backend/:resource - List rows visible to the caller
pub async fn get(
    State(controller): State<Arc<ResourceController>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Row>> {
    let rows = controller.list(&caller, query.search.as_deref()).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/backend/:resource - Create a row
pub async fn post(
    State(controller): State<Arc<ResourceController>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let Json(payload) = payload?;
    let created = controller.create(&caller, &payload).await?;

    let id = created.get("id").and_then(|v| v.as_str()).unwrap_or("?");
    tracing::info!("Created {} {}", controller.descriptor().table, id);
    Ok(ApiResponse::created(created))
}
