mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_of, TestApp};
use microcredit_api::gateway::MemoryGateway;
use microcredit_api::resources::catalog;

#[tokio::test]
async fn type_must_be_income_or_expense() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .admin(
            Method::POST,
            "/api/backend/transactions",
            Some(json!({"type": "transfer", "amount": 10})),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["type"].is_string(), "body: {}", res.body);

    for kind in ["income", "expense"] {
        let tx = app
            .seed("transactions", json!({"type": kind, "amount": 10, "description": "cuota"}))
            .await?;
        assert_eq!(tx["type"], kind);
    }

    Ok(())
}

#[tokio::test]
async fn partner_reference_is_optional() -> Result<()> {
    let app = TestApp::new();
    let partner = app.seed("partners", json!({"name": "Socio", "capital": 100})).await?;

    let tx = app
        .seed(
            "transactions",
            json!({"type": "income", "amount": 25.5, "partner_id": partner["id"]}),
        )
        .await?;
    assert_eq!(tx["partner_id"], partner["id"]);

    let tx = app.seed("transactions", json!({"type": "expense", "amount": 3})).await?;
    assert!(tx.get("partner_id").is_none());

    Ok(())
}

#[tokio::test]
async fn hard_delete_removes_row() -> Result<()> {
    let app = TestApp::new();
    let tx = app.seed("transactions", json!({"type": "income", "amount": 10})).await?;
    let uri = format!("/api/backend/transactions/{}", id_of(&tx));

    let res = app.admin(Method::DELETE, &uri, None).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(app.gateway.rows("transactions").await.is_empty());

    let res = app.admin(Method::GET, &uri, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.admin(Method::DELETE, &uri, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn silent_backend_delete_falls_back_to_existence_check() -> Result<()> {
    let app = TestApp::with_gateway(MemoryGateway::for_resources(catalog::ALL).without_delete_representation());
    let tx = app.seed("transactions", json!({"type": "income", "amount": 10})).await?;

    // Nothing reported and nothing left: indistinguishable from a missing id
    let res = app
        .admin(Method::DELETE, &format!("/api/backend/transactions/{}", id_of(&tx)), None)
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(app.gateway.rows("transactions").await.is_empty());

    Ok(())
}

#[tokio::test]
async fn listing_is_open_to_visitors() -> Result<()> {
    let app = TestApp::new();
    app.seed("transactions", json!({"type": "income", "amount": 10})).await?;

    let res = app.visitor(Method::GET, "/api/backend/transactions", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().map(Vec::len), Some(1));

    let res = app
        .visitor(
            Method::POST,
            "/api/backend/transactions",
            Some(json!({"type": "income", "amount": 10})),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    Ok(())
}
