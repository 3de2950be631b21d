#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use microcredit_api::app::{router, AppState};
use microcredit_api::auth::{SharedAccess, StaticAccess};
use microcredit_api::gateway::MemoryGateway;
use microcredit_api::resources::catalog;

/// In-process application over a shared memory gateway. Requests can be
/// issued as an admin or as a visitor against the same data.
pub struct TestApp {
    pub gateway: Arc<MemoryGateway>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_gateway(MemoryGateway::for_resources(catalog::ALL))
    }

    pub fn with_gateway(gateway: MemoryGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn router_with(&self, access: SharedAccess) -> Router {
        router(AppState::new(self.gateway.clone(), access))
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        send(self.router_with(Arc::new(StaticAccess::new(true))), method, uri, body, None).await
    }

    pub async fn visitor(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        send(self.router_with(Arc::new(StaticAccess::new(false))), method, uri, body, None).await
    }

    /// Create a row as admin and return its `data`
    pub async fn seed(&self, resource: &str, body: Value) -> Result<Value> {
        let res = self
            .admin(Method::POST, &format!("/api/backend/{}", resource), Some(body))
            .await?;
        anyhow::ensure!(
            res.status == StatusCode::CREATED,
            "seeding {} failed with {}: {}",
            resource,
            res.status,
            res.body
        );
        Ok(res.data().clone())
    }

    /// Insert a row straight into the gateway, bypassing validation
    pub async fn insert_raw(&self, table: &str, body: Value) -> Result<Value> {
        use microcredit_api::gateway::DataGateway;
        use microcredit_api::types::Caller;

        let record = body.as_object().cloned().context("raw rows must be objects")?;
        let rows = self.gateway.insert(&Caller::admin(), table, record).await?;
        let row = rows.into_iter().next().context("insert returned no row")?;
        Ok(Value::Object(row))
    }
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
    };

    Ok(TestResponse { status, body })
}

pub fn id_of(row: &Value) -> String {
    row["id"].as_str().unwrap_or_default().to_string()
}
