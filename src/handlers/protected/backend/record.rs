use std::sync::Arc;

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::ResourceController;
use crate::types::{Caller, Row};

/// GET /api/backend/:resource/:id - Fetch one row, soft-deleted or not
pub async fn get(
    State(controller): State<Arc<ResourceController>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Row> {
    let Path(id) = id?;
    let row = controller.get_by_id(id).await?;
    Ok(ApiResponse::success(row))
}

/// PATCH /api/backend/:resource/:id - Apply the fields present in the body
pub async fn patch(
    State(controller): State<Arc<ResourceController>>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let updated = controller.update(&caller, id, &payload).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/backend/:resource/:id - Soft or hard delete, per resource
pub async fn delete(
    State(controller): State<Arc<ResourceController>>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    controller.delete(&caller, id).await?;

    tracing::info!("Deleted {} {}", controller.descriptor().table, id);
    Ok(ApiResponse::no_content())
}
