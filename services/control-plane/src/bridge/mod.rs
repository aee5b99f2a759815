//! Dispatch bridge: a synchronous call contract over an asynchronous broker.
//!
//! One bridge instance serves one call at a time; the caller is blocked for
//! the full round trip, so no two pending calls ever coexist on an instance.
//! Concurrent requests each build their own bridge from a
//! [`pylon_wire::Connector`].

pub mod mqtt;

use std::time::Duration;

use pylon_wire::{CallProperties, Command, Reply, Transport, TransportError};
use thiserror::Error;
use tracing::{debug, warn};

/// Failures of one dispatch round trip.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed reply: {0}")]
    Protocol(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// A single-call RPC endpoint over one broker connection.
pub struct Bridge {
    transport: Box<dyn Transport>,
    timeout: Duration,
}

impl Bridge {
    pub fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Publishes `command` and blocks until the correlated reply arrives or
    /// the timeout elapses.
    ///
    /// Replies carrying any other correlation identifier are discarded: they
    /// are stale duplicates from an earlier abandoned call and must never be
    /// surfaced to this caller. The reply destination is released on every
    /// exit path, including failures.
    pub async fn call(&mut self, command: &Command) -> Result<Reply, BridgeError> {
        let props = CallProperties::generate();
        let payload =
            serde_json::to_vec(command).map_err(|e| BridgeError::Protocol(e.to_string()))?;
        let route = command.message_type().route();

        self.transport.open_reply(&props.reply_to).await?;
        let result = self.exchange(&route, &props, &payload).await;
        if let Err(e) = self.transport.close_reply(&props.reply_to).await {
            warn!(
                error = %e,
                reply_to = %props.reply_to,
                "failed to release reply destination"
            );
        }
        result
    }

    async fn exchange(
        &mut self,
        route: &pylon_wire::Route,
        props: &CallProperties,
        payload: &[u8],
    ) -> Result<Reply, BridgeError> {
        debug!(
            routing_key = %route.routing_key,
            correlation_id = %props.correlation_id,
            "publishing command"
        );
        self.transport.publish(route, props, payload).await?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let delivery =
                match tokio::time::timeout_at(deadline, self.transport.recv()).await {
                    Ok(Ok(delivery)) => delivery,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => return Err(BridgeError::Timeout(self.timeout)),
                };

            match delivery.correlation_id.as_deref() {
                Some(correlation_id) if correlation_id == props.correlation_id => {
                    let reply: Reply = serde_json::from_slice(&delivery.payload)
                        .map_err(|e| BridgeError::Protocol(e.to_string()))?;
                    return Ok(reply);
                }
                other => {
                    warn!(
                        expected = %props.correlation_id,
                        received = ?other,
                        "discarding uncorrelated reply"
                    );
                }
            }
        }
    }
}
