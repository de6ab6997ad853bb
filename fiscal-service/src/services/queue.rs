use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, Client};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use super::error::ServiceError;

/// Blocking-pop window for [`MessageQueue::receive`].
pub const RECEIVE_TIMEOUT_SECS: u64 = 5;

const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not enabled: {0}")]
    NotEnabled(String),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        QueueError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::InvalidDestination(msg) => ServiceError::InvalidArgument(msg),
            other => ServiceError::Queue(other.to_string()),
        }
    }
}

/// Envelope stored on the wire. `subject` names the payload type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueMessage {
    pub message_id: String,
    pub subject: String,
    pub content_type: String,
    pub body: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueMessage {
    pub fn new<T: Serialize>(subject: &str, payload: &T) -> Result<Self, QueueError> {
        Ok(Self {
            message_id: Uuid::new_v4().to_string(),
            subject: subject.to_string(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            body: serde_json::to_value(payload)?,
            enqueued_at: Utc::now(),
        })
    }

    /// Decodes a popped entry; text from foreign producers is wrapped as-is.
    fn from_wire(raw: String) -> Self {
        serde_json::from_str(&raw).unwrap_or_else(|_| Self {
            message_id: Uuid::new_v4().to_string(),
            subject: "raw".to_string(),
            content_type: "text/plain".to_string(),
            body: serde_json::Value::String(raw),
            enqueued_at: Utc::now(),
        })
    }
}

fn destination(name: &str) -> Result<&str, QueueError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(QueueError::InvalidDestination(
            "Queue or topic name is required".to_string(),
        ));
    }
    Ok(trimmed)
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send_to_queue(&self, queue: &str, message: &QueueMessage) -> Result<(), QueueError>;

    async fn send_to_topic(&self, topic: &str, message: &QueueMessage) -> Result<(), QueueError>;

    /// Pops one message, waiting up to [`RECEIVE_TIMEOUT_SECS`]. `None` when empty.
    async fn receive(&self, queue: &str) -> Result<Option<QueueMessage>, QueueError>;

    async fn health_check(&self) -> Result<(), QueueError>;
}

/// Redis-backed queue: queues are lists, topics are pub/sub channels.
#[derive(Clone)]
pub struct RedisQueue {
    client: Client,
    manager: ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        tracing::info!("Connecting to Redis message queue");
        let client = Client::open(url)?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            QueueError::Backend(format!("Failed to connect to Redis: {}", e))
        })?;

        tracing::info!("Successfully connected to Redis message queue");
        Ok(Self { client, manager })
    }

    fn queue_key(queue: &str) -> String {
        format!("queue:{}", queue)
    }

    fn topic_channel(topic: &str) -> String {
        format!("topic:{}", topic)
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn send_to_queue(&self, queue: &str, message: &QueueMessage) -> Result<(), QueueError> {
        let queue = destination(queue)?;
        let mut conn = self.manager.clone();
        let body = serde_json::to_string(message)?;

        let _: i64 = redis::cmd("LPUSH")
            .arg(Self::queue_key(queue))
            .arg(body)
            .query_async(&mut conn)
            .await?;

        tracing::info!(queue = %queue, message_id = %message.message_id, "Message sent to queue");
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, message: &QueueMessage) -> Result<(), QueueError> {
        let topic = destination(topic)?;
        let mut conn = self.manager.clone();
        let body = serde_json::to_string(message)?;

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(Self::topic_channel(topic))
            .arg(body)
            .query_async(&mut conn)
            .await?;

        tracing::info!(
            topic = %topic,
            message_id = %message.message_id,
            receivers,
            "Message published to topic"
        );
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Option<QueueMessage>, QueueError> {
        let queue = destination(queue)?;
        // BRPOP blocks its connection; keep it off the shared manager.
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(Self::queue_key(queue))
            .arg(RECEIVE_TIMEOUT_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(popped.map(|(_, raw)| QueueMessage::from_wire(raw)))
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| QueueError::Backend(format!("Redis health check failed: {}", e)))
    }
}

/// Process-local queue used by tests and when `QUEUE_ENABLED=false`.
///
/// A disabled instance rejects every send, which lets tests exercise the
/// failure path of publishers.
pub struct InMemoryQueue {
    enabled: bool,
    send_count: AtomicU64,
    queues: Mutex<HashMap<String, VecDeque<QueueMessage>>>,
    published: Mutex<Vec<(String, QueueMessage)>>,
}

impl InMemoryQueue {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            queues: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Number of messages waiting on `queue`.
    pub fn pending(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    /// Messages published to `topic`, oldest first.
    pub fn published_to(&self, topic: &str) -> Vec<QueueMessage> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn ensure_enabled(&self) -> Result<(), QueueError> {
        if !self.enabled {
            return Err(QueueError::NotEnabled(
                "In-memory queue is not enabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send_to_queue(&self, queue: &str, message: &QueueMessage) -> Result<(), QueueError> {
        let queue = destination(queue)?;
        self.ensure_enabled()?;

        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(queue.to_string())
            .or_default()
            .push_back(message.clone());
        self.send_count.fetch_add(1, Ordering::SeqCst);

        tracing::info!(queue = %queue, message_id = %message.message_id, "[MEMORY] Message queued");
        Ok(())
    }

    async fn send_to_topic(&self, topic: &str, message: &QueueMessage) -> Result<(), QueueError> {
        let topic = destination(topic)?;
        self.ensure_enabled()?;

        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), message.clone()));
        self.send_count.fetch_add(1, Ordering::SeqCst);

        tracing::info!(topic = %topic, message_id = %message.message_id, "[MEMORY] Message published");
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Option<QueueMessage>, QueueError> {
        let queue = destination(queue)?;
        self.ensure_enabled()?;

        Ok(self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(queue)
            .and_then(VecDeque::pop_front))
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        self.ensure_enabled()
    }
}
