//! The relay served over HTTP: middleware, reloads, and the SDK on top.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use file_transfer_sdk::{ClientError, FileTransferClient};
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_preflight_over_http() {
    let backend = common::start_echo_backend().await;
    let relay = common::start_relay_server(common::relay_config(backend)).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .request(reqwest::Method::OPTIONS, relay.url("/files/transfer"))
        .header("Origin", "https://files.example.org")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Relay unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
    assert_eq!(res.text().await.unwrap(), "");

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_post_round_trip_over_http() {
    let backend = common::start_echo_backend().await;
    let relay = common::start_relay_server(common::relay_config(backend)).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .post(relay.url("/files/return?notify=true"))
        .header("Authorization", "Bearer abc")
        .json(&json!({ "fileCode": "F-5" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS");
    assert!(res.headers().contains_key("x-request-id"));

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["path"], "/api/files/return");
    assert_eq!(echo["query"], "notify=true");
    assert_eq!(echo["headers"]["authorization"], "Bearer abc");
    assert_eq!(echo["body"], r#"{"fileCode":"F-5"}"#);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let backend = common::start_echo_backend().await;
    let mut config = common::relay_config(backend);
    config.listener.max_body_bytes = 16;
    let relay = common::start_relay_server(config).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .post(relay.url("/files/transfer"))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_config_update_switches_upstream() {
    let first = common::start_backend(Router::new().route("/api/whoami", get(|| async { "first" }))).await;
    let second = common::start_backend(Router::new().route("/api/whoami", get(|| async { "second" }))).await;
    let relay = common::start_relay_server(common::relay_config(first)).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let body = client.get(relay.url("/whoami")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "first");

    relay.config_updates.send(common::relay_config(second)).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let body = client.get(relay.url("/whoami")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "second");

    relay.shutdown.trigger();
}

/// Backend that only answers file status for the bearer token it issued.
async fn start_auth_backend() -> std::net::SocketAddr {
    common::start_backend(
        Router::new()
            .route(
                "/api/auth/signin",
                post(|| async { Json(json!({ "accessToken": "tok-9", "username": "clerk" })) }),
            )
            .route(
                "/api/files/{code}/status",
                get(|headers: HeaderMap| async move {
                    let authorized = headers
                        .get("authorization")
                        .map(|v| v == "Bearer tok-9")
                        .unwrap_or(false);
                    if authorized {
                        (StatusCode::OK, Json(json!({ "status": "ACCEPTED" })))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "no token" })))
                    }
                }),
            ),
    )
    .await
}

#[tokio::test]
async fn test_sdk_session_through_relay() {
    let backend = start_auth_backend().await;
    let relay = common::start_relay_server(common::relay_config(backend)).await;
    let sdk = FileTransferClient::new(&relay.url(""));

    let (session, _) = sdk.login("clerk", "secret").await.unwrap();
    let status = sdk.file_status(&session, "F-5").await.unwrap();
    assert_eq!(status["status"], "ACCEPTED");
    assert!(session.is_authenticated());

    relay.shutdown.trigger();
}

#[tokio::test]
async fn test_sdk_session_cleared_when_relay_drops_authorization() {
    let backend = start_auth_backend().await;
    let mut config = common::relay_config(backend);
    config.upstream.forward_headers.clear();
    let relay = common::start_relay_server(config).await;
    let sdk = FileTransferClient::new(&relay.url(""));

    let (session, _) = sdk.login("clerk", "secret").await.unwrap();
    let err = sdk.file_status(&session, "F-5").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!session.is_authenticated());

    relay.shutdown.trigger();
}
