mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, ADMIN_TOKEN, SHARED_SECRET, USER_TOKEN};

#[tokio::test]
async fn missing_token_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.send(Method::GET, "/quotes", None, None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized", "message": "missing_token" }));
    assert_eq!(app.provider.get_user_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn non_bearer_authorization_counts_as_missing() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .http
        .get(app.url("/quotes"))
        .header("Authorization", format!("Token {}", USER_TOKEN))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<serde_json::Value>().await?["message"], "missing_token");
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.send(Method::GET, "/quotes", Some("forged"), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid_token");
    Ok(())
}

#[tokio::test]
async fn any_valid_token_reaches_domain_resources() -> Result<()> {
    let app = TestApp::spawn().await?;
    // No profile at all: role is irrelevant for domain resources
    let (status, body) = app.send(Method::GET, "/vehicles", Some(USER_TOKEN), None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn shared_secret_skips_identity_lookup() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, _) = app.send(Method::GET, "/quotes", Some(SHARED_SECRET), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/admin/users", Some(SHARED_SECRET), None).await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.provider.get_user_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn near_miss_shared_secret_is_just_an_invalid_token() -> Result<()> {
    let app = TestApp::spawn().await?;

    let near_miss = format!("{}x", SHARED_SECRET);
    let (status, body) = app.send(Method::GET, "/quotes", Some(&near_miss), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid_token");
    assert_eq!(app.provider.get_user_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_admin_profile() -> Result<()> {
    let app = TestApp::spawn().await?;

    // No profile yet
    let (status, body) = app.send(Method::GET, "/admin/users", Some(ADMIN_TOKEN), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "not_admin");

    app.seed_default_profiles().await;

    let (status, body) = app.send(Method::GET, "/admin/users", Some(USER_TOKEN), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "not_admin");

    let (status, _) = app.send(Method::GET, "/admin/users", Some(ADMIN_TOKEN), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn role_in_request_body_is_ignored() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.seed_default_profiles().await;

    let res = app
        .http
        .post(app.url("/admin/users"))
        .bearer_auth(USER_TOKEN)
        .header("X-Role", "admin")
        .json(&json!({ "role": "admin", "email": "x@y.z", "password": "12345678" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.provider.create_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn profile_lookup_failure_is_reported() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.seed_default_profiles().await;
    app.faults.fail_reads(true);

    let (status, body) = app.send(Method::GET, "/admin/users", Some(ADMIN_TOKEN), None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "profile_error");
    Ok(())
}
