mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_of, TestApp};

#[tokio::test]
async fn capital_must_be_positive() -> Result<()> {
    let app = TestApp::new();

    for capital in [json!(0), json!(-100), json!("1000")] {
        let res = app
            .admin(
                Method::POST,
                "/api/backend/partners",
                Some(json!({"name": "Socio", "capital": capital})),
            )
            .await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "capital {} accepted", capital);
        assert!(res.body["field_errors"]["capital"].is_string());
    }

    let partner = app.seed("partners", json!({"name": "Socio", "capital": 1000})).await?;
    assert_eq!(partner["capital"], 1000);

    Ok(())
}

#[tokio::test]
async fn withdrawals_only_on_update_and_non_negative() -> Result<()> {
    let app = TestApp::new();
    let partner = app
        .seed("partners", json!({"name": "Socio", "capital": 500, "withdrawals": 50}))
        .await?;
    assert!(partner.get("withdrawals").is_none(), "create accepted withdrawals: {}", partner);
    let uri = format!("/api/backend/partners/{}", id_of(&partner));

    let res = app.admin(Method::PATCH, &uri, Some(json!({"withdrawals": -1}))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .admin(Method::PATCH, &uri, Some(json!({"withdrawals": 0, "generated_interest": 12.5})))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "unexpected body: {}", res.body);
    assert_eq!(res.data()["withdrawals"], 0);
    assert_eq!(res.data()["generated_interest"], 12.5);
    assert_eq!(res.data()["capital"], 500);

    Ok(())
}

#[tokio::test]
async fn search_parameter_is_ignored() -> Result<()> {
    let app = TestApp::new();
    app.seed("partners", json!({"name": "Alpha", "capital": 1})).await?;
    app.seed("partners", json!({"name": "Beta", "capital": 2})).await?;

    let res = app.admin(Method::GET, "/api/backend/partners?search=Alpha", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().map(Vec::len), Some(2));

    Ok(())
}

#[tokio::test]
async fn soft_delete_is_one_way() -> Result<()> {
    let app = TestApp::new();
    let partner = app.seed("partners", json!({"name": "Socio", "capital": 10})).await?;
    let uri = format!("/api/backend/partners/{}", id_of(&partner));

    let res = app.admin(Method::DELETE, &uri, None).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.visitor(Method::GET, "/api/backend/partners", None).await?;
    assert_eq!(res.data(), &json!([]));

    let res = app.admin(Method::GET, &uri, None).await?;
    assert!(res.data()["deleted_at"].is_string());
    assert_eq!(res.data()["name"], "Socio");

    Ok(())
}

#[tokio::test]
async fn visitors_cannot_modify() -> Result<()> {
    let app = TestApp::new();
    let partner = app.seed("partners", json!({"name": "Socio", "capital": 10})).await?;
    let uri = format!("/api/backend/partners/{}", id_of(&partner));

    let res = app.visitor(Method::PATCH, &uri, Some(json!({"name": "Otro"}))).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["code"], "FORBIDDEN");

    let res = app.visitor(Method::DELETE, &uri, None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.visitor(Method::GET, &uri, None).await?;
    assert_eq!(res.data()["name"], "Socio");
    assert!(res.data()["deleted_at"].is_null());

    Ok(())
}
