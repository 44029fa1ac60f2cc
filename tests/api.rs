//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;

mod common;
use common::test_state;

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = switchboard::api::router(test_state(None));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_banner() {
    let app = switchboard::api::router(test_state(None));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], "Twilio Media Stream Server is running!");
}

#[tokio::test]
async fn test_incoming_call_returns_stream_instruction() {
    let state = test_state(None);
    let app = switchboard::api::router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .header(header::HOST, "relay.example.com")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("CallSid=CA1&From=%2B5511999999999"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );

    let body = body_string(response).await;
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<Connect>"));

    let prefix = "wss://relay.example.com/media-stream/";
    let start = body.find(prefix).expect("stream url missing") + prefix.len();
    let token = &body[start..start + 36];
    let token = uuid::Uuid::parse_str(token).expect("token is not a uuid");

    assert_eq!(state.pending.len().await, 1);
    let pending = state.pending.take(&token).await.expect("token not registered");
    assert_eq!(pending.call_sid.as_deref(), Some("CA1"));
    assert!(pending.instructions.starts_with("You are a test persona."));
    assert!(state.pending.is_empty().await);
}

#[tokio::test]
async fn test_incoming_call_accepts_get_without_form() {
    let state = test_state(Some("https://calls.example.com"));
    let app = switchboard::api::router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/incoming-call")
                .header(header::HOST, "internal:5050")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("wss://calls.example.com/media-stream/"));
    assert!(!body.contains("internal:5050"));
    assert_eq!(state.pending.len().await, 1);
}

#[tokio::test]
async fn test_incoming_call_without_host_is_rejected() {
    let state = test_state(None);
    let app = switchboard::api::router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.pending.is_empty().await);
}

#[tokio::test]
async fn test_media_stream_requires_upgrade() {
    let app = switchboard::api::router(test_state(None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_server_reports_port_in_use() {
    let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = switchboard::api::ApiServer::new(test_state(None), port)
        .run()
        .await;

    assert!(matches!(result, Err(switchboard::Error::Io(_))));
}
