//! The transport seam the dispatch bridge publishes and consumes through.
//!
//! A [`Transport`] is one broker connection with at most one open reply
//! destination. It is owned exclusively by the call using it; concurrent
//! callers obtain their own via a [`Connector`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::route::Route;

/// Per-call correlation metadata attached to every published command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallProperties {
    /// Unique token echoed back on the reply.
    pub correlation_id: String,
    /// Private destination the reply must be delivered to.
    pub reply_to: String,
}

impl CallProperties {
    /// Generates fresh properties for one call: a random correlation
    /// identifier and a reply destination derived from it, both unique for
    /// the process lifetime.
    pub fn generate() -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let reply_to = format!("pylon/reply/{correlation_id}");
        Self {
            correlation_id,
            reply_to,
        }
    }
}

/// One message consumed from the open reply destination.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Correlation identifier the sender tagged the message with, if any.
    pub correlation_id: Option<String>,
    /// Raw reply envelope bytes.
    pub payload: Vec<u8>,
}

/// Broker-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("broker connection failure: {0}")]
    Connection(String),

    #[error("publish failure: {0}")]
    Publish(String),

    #[error("reply destination closed")]
    Closed,
}

/// A single broker connection, used by exactly one call at a time.
#[async_trait]
pub trait Transport: Send {
    /// Declares the private reply destination for the upcoming call.
    async fn open_reply(&mut self, reply_to: &str) -> Result<(), TransportError>;

    /// Publishes a serialized command envelope to the given route, attaching
    /// the call's correlation metadata.
    async fn publish(
        &mut self,
        route: &Route,
        props: &CallProperties,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Receives the next message from the open reply destination. Blocks
    /// until a message arrives or the transport fails.
    async fn recv(&mut self) -> Result<Delivery, TransportError>;

    /// Releases the reply destination. Must be called on every exit path.
    async fn close_reply(&mut self, reply_to: &str) -> Result<(), TransportError>;
}

/// Produces fresh transports, one per call.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}
