mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use common::{send, TestApp};
use microcredit_api::auth::JwtAccess;

const SECRET: &str = "integration-test-jwt-secret";

fn token(claims: Value) -> Result<String> {
    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))?)
}

fn exp() -> i64 {
    (Utc::now() + Duration::hours(1)).timestamp()
}

#[tokio::test]
async fn jwt_roles_decide_admin_rights() -> Result<()> {
    let app = TestApp::new();
    let router = app.router_with(Arc::new(JwtAccess::new(SECRET)?));
    let body = json!({"last_name": "Diaz", "first_name": "Ana"});

    let admin = token(json!({"sub": "8d0b3a64-2f3c-4a1e-9a53-0d6f0f3f2b11", "role": "authenticated",
        "app_metadata": {"is_admin": true}, "exp": exp()}))?;
    let res = send(router.clone(), Method::POST, "/api/backend/clients", Some(body.clone()), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::CREATED, "unexpected body: {}", res.body);

    let user = token(json!({"sub": "1c9f4e1a-0b7d-4f3e-8c55-3f7a2d9e6b40", "role": "authenticated", "exp": exp()}))?;
    let res = send(router.clone(), Method::POST, "/api/backend/clients", Some(body.clone()), Some(&user)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(router.clone(), Method::GET, "/api/backend/clients", None, Some(&user)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn anonymous_requests_are_visitors() -> Result<()> {
    let app = TestApp::new();
    let router = app.router_with(Arc::new(JwtAccess::new(SECRET)?));

    let res = send(router.clone(), Method::GET, "/api/backend/loans", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(
        router,
        Method::POST,
        "/api/backend/transactions",
        Some(json!({"type": "income", "amount": 1})),
        None,
    )
    .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn invalid_tokens_are_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let router = app.router_with(Arc::new(JwtAccess::new(SECRET)?));

    let res = send(router.clone(), Method::GET, "/api/backend/clients", None, Some("garbage")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], "UNAUTHORIZED");

    let forged = encode(
        &Header::default(),
        &json!({"role": "service_role", "exp": exp()}),
        &EncodingKey::from_secret(b"some-other-secret"),
    )?;
    let res = send(router.clone(), Method::GET, "/api/backend/clients", None, Some(&forged)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // Public probes never look at credentials
    let res = send(router, Method::GET, "/health", None, Some("garbage")).await?;
    assert_eq!(res.status, StatusCode::OK);

    Ok(())
}
