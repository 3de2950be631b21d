use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::gateway::SharedGateway;
use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::catalog;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let resources: Vec<String> = catalog::ALL
        .iter()
        .map(|r| format!("/api/backend/{}", r.name))
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Microcredit API",
            "version": version,
            "description": "Back-office CRUD API for clients, partners, loans, transactions and follow-ups",
            "endpoints": {
                "health": "/health, /api/health (public)",
                "ready": "/health/ready (public, probes the data gateway)",
                "resources": resources,
            }
        }
    }))
}

/// GET /health and /api/health - Liveness, no backend call
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Microcredit API running"
    }))
}

/// GET /health/ready - Readiness, probes the data gateway
pub async fn ready(State(gateway): State<SharedGateway>) -> ApiResult<Value> {
    if let Err(e) = gateway.health_check().await {
        tracing::warn!("Gateway health check failed: {}", e);
        return Err(ApiError::service_unavailable(format!("{} gateway unavailable", gateway.name())));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "gateway": gateway.name()
    })))
}
