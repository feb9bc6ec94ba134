mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.send(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().unwrap_or_default();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "bad timestamp: {}", body);
    Ok(())
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() -> Result<()> {
    let app = TestApp::spawn().await?;

    for path in ["/quotes", "/admin/users", "/does-not-exist/1"] {
        let res = app.http.request(Method::OPTIONS, app.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT, "preflight {}", path);
        let headers = res.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET,POST,PUT,DELETE,OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type, Authorization");
        assert!(res.text().await?.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn error_responses_carry_cors_headers() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.http.get(app.url("/quotes")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    Ok(())
}

#[tokio::test]
async fn unmatched_paths_are_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.http.get(format!("{}/customers", app.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<serde_json::Value>().await?, json!({ "error": "not_found" }));

    let (status, _) = app
        .send(Method::GET, "/quotes/1/extra", Some(common::SHARED_SECRET), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn legacy_index_prefix_is_an_alias() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.http.get(format!("{}/api/index/health", app.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .http
        .get(format!("{}/api/index/customers", app.base_url))
        .bearer_auth(common::SHARED_SECRET)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?, json!([]));
    Ok(())
}
