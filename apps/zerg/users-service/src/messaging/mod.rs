//! Messaging abstraction layer
//!
//! Request/reply over a broker, behind a trait so handlers can be tested
//! without a running NATS server.

mod nats_broker;

pub use nats_broker::NatsBroker;

use async_trait::async_trait;
use domain_users::{RpcFault, UserError};
use eyre::Result;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Inbound request body, as sent by NestJS-style clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestEnvelope {
    /// Pattern as the client saw it. The subject is authoritative.
    #[serde(default)]
    pub pattern: Option<Value>,
    /// Correlation id echoed back in the reply
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Reply body: exactly one of `response` or `err` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEnvelope {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<RpcFault>,
    pub is_disposed: bool,
}

impl ReplyEnvelope {
    pub fn success(id: Option<String>, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            err: None,
            is_disposed: true,
        }
    }

    pub fn fault(id: Option<String>, error: &UserError) -> Self {
        Self {
            id,
            response: None,
            err: Some(error.to_fault()),
            is_disposed: true,
        }
    }
}

/// Received message with metadata
pub struct ReceivedMessage {
    /// Subject the message was received on, which is the pattern name
    pub subject: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Reply subject for request-reply patterns
    pub reply: Option<String>,
}

impl ReceivedMessage {
    /// Deserialize the payload. An empty body reads as `T::default()`.
    pub fn parse_payload<T: DeserializeOwned + Default>(&self) -> Result<T> {
        if self.payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        let data: T = serde_json::from_slice(&self.payload)?;
        Ok(data)
    }
}

/// Abstract message broker interface
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish raw bytes to a subject
    async fn publish_raw(&self, subject: &str, payload: &[u8]) -> Result<()>;

    /// Create a queue group subscription (load-balanced across instances)
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<Box<dyn MessageStream>>;

    /// Wait until everything published so far has reached the server
    async fn flush(&self) -> Result<()>;
}

/// Stream of incoming messages
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Receive the next message, `None` once the subscription is closed
    async fn next(&mut self) -> Option<ReceivedMessage>;

    /// Stop receiving new messages. Messages already delivered are still
    /// returned by `next`, which then yields `None`.
    async fn unsubscribe(&mut self) -> Result<()>;
}
