use serde::{Deserialize, Serialize};

use crate::services::QueueMessage;

#[derive(Debug, Deserialize)]
pub struct SendParams {
    /// Envelope subject; defaults to `message`.
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueueSendResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct QueueReceiveResponse {
    pub success: bool,
    pub message: QueueMessage,
}
