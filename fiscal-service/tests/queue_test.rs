mod common;

use axum::http::StatusCode;
use common::TestApp;
use fiscal_service::services::InMemoryQueue;
use serde_json::json;

#[tokio::test]
async fn send_then_receive_round_trips_the_envelope() {
    let app = TestApp::spawn();

    let sent = app
        .post(
            "/queue/send/fatura-queue?subject=BillCreated",
            json!({ "bill_id": "42", "total": 3000 }),
        )
        .await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["success"], true);
    let message_id = sent.body["message_id"].as_str().unwrap().to_string();

    let received = app.get("/queue/receive/fatura-queue").await;
    assert_eq!(received.status, StatusCode::OK);
    let message = &received.body["message"];
    assert_eq!(message["message_id"], message_id);
    assert_eq!(message["subject"], "BillCreated");
    assert_eq!(message["content_type"], "application/json");
    assert_eq!(message["body"], json!({ "bill_id": "42", "total": 3000 }));
}

#[tokio::test]
async fn messages_are_received_in_send_order() {
    let app = TestApp::spawn();
    for n in 1..=3 {
        app.post("/queue/send/ordered", json!({ "n": n })).await;
    }

    for n in 1..=3 {
        let received = app.get("/queue/receive/ordered").await;
        assert_eq!(received.body["message"]["body"]["n"], n);
        assert_eq!(received.body["message"]["subject"], "message");
    }
}

#[tokio::test]
async fn empty_queue_is_not_found() {
    let app = TestApp::spawn();

    let response = app.get("/queue/receive/nothing-here").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "No messages in queue");
}

#[tokio::test]
async fn topic_publish_is_recorded() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/queue/send-topic/notafiscal-topic?subject=InvoiceNotification",
            json!({ "numeroNota": "NF-1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let published = app.queue.published_to("notafiscal-topic");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].subject, "InvoiceNotification");
    assert_eq!(published[0].body["numeroNota"], "NF-1");
}

#[tokio::test]
async fn disabled_queue_hides_backend_details() {
    let app = TestApp::with_queue(InMemoryQueue::new(false));

    let response = app.post("/queue/send/anything", json!({ "a": 1 })).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Queue error");
    assert!(response.body.get("details").is_none());
}
