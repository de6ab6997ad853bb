mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn();

    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["service"], "fiscal-service");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(response.body["checks"]["mongodb"], "in-memory");
    assert_eq!(response.body["checks"]["queue"], "up");
}

#[tokio::test]
async fn readiness_and_metrics_respond() {
    let app = TestApp::spawn();

    assert_eq!(app.get("/ready").await.status, StatusCode::OK);

    let metrics = app.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert_eq!(
        metrics.headers.get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = TestApp::spawn();

    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.headers.get("x-request-id").unwrap(), "req-123");
    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");

    let generated = app.get("/health").await;
    assert!(!generated
        .headers
        .get("x-request-id")
        .unwrap()
        .is_empty());
}
