mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront_api::build_app;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn json_request(method: &str, uri: &str, body: Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn unknown_paths_get_a_json_404() -> anyhow::Result<()> {
    let app = build_app(common::setup_state().await?);

    let (status, body) = send(&app, Request::get("/api/nowhere").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/nowhere");

    let (status, body) = send(&app, Request::get("/health").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "up");
    Ok(())
}

#[tokio::test]
async fn cart_requires_a_bearer_token() -> anyhow::Result<()> {
    let app = build_app(common::setup_state().await?);

    let (status, _) = send(&app, Request::get("/api/cart").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com",
                "password": "cobol-forever"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "grace@example.com", "password": "cobol-forever" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().expect("token").to_string();
    assert!(token.starts_with("Bearer "));

    let request = Request::get("/api/cart")
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())?;
    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_are_rejected_with_400() -> anyhow::Result<()> {
    let app = build_app(common::setup_state().await?);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({
                "first_name": "",
                "last_name": "Nobody",
                "email": "not-an-email",
                "password": "short"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());
    Ok(())
}
