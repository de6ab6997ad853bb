use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

use crate::dtos::{QueueReceiveResponse, QueueSendResponse, SendParams};
use crate::services::{QueueMessage, ServiceError};
use crate::AppState;

const DEFAULT_SUBJECT: &str = "message";

fn envelope(
    params: SendParams,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<QueueMessage, AppError> {
    let Json(payload) =
        body.map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))?;
    let subject = params
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    QueueMessage::new(&subject, &payload).map_err(|e| ServiceError::from(e).into())
}

#[tracing::instrument(skip(state, params, body))]
pub async fn send_to_queue(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    Query(params): Query<SendParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<QueueSendResponse>, AppError> {
    let message = envelope(params, body)?;
    state
        .queue
        .send_to_queue(&queue, &message)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(QueueSendResponse {
        success: true,
        message: format!("Message sent to queue {}", queue),
        message_id: message.message_id,
    }))
}

#[tracing::instrument(skip(state, params, body))]
pub async fn send_to_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(params): Query<SendParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<QueueSendResponse>, AppError> {
    let message = envelope(params, body)?;
    state
        .queue
        .send_to_topic(&topic, &message)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(QueueSendResponse {
        success: true,
        message: format!("Message published to topic {}", topic),
        message_id: message.message_id,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn receive_from_queue(
    State(state): State<AppState>,
    Path(queue): Path<String>,
) -> Result<Json<QueueReceiveResponse>, AppError> {
    let message = state
        .queue
        .receive(&queue)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No messages in queue")))?;

    Ok(Json(QueueReceiveResponse {
        success: true,
        message,
    }))
}
