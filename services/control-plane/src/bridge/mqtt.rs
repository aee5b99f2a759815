//! MQTT transport backend.
//!
//! MQTT 3.1.1 has no per-message metadata, so the correlation identifier and
//! reply destination ride in a small JSON frame around the envelope. A route
//! maps onto topic `pylon/{exchange}/{queue}`; the reply destination name is
//! already topic-shaped (`pylon/reply/{uuid}`) and is used verbatim.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use pylon_wire::{CallProperties, Connector, Delivery, Route, Transport, TransportError};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const KEEP_ALIVE: Duration = Duration::from_secs(15);
const CHANNEL_CAPACITY: usize = 16;

/// Outbound frame wrapping a command envelope with its call metadata.
#[derive(Debug, Serialize)]
struct CommandFrame<'a> {
    correlation_id: &'a str,
    reply_to: &'a str,
    body: Value,
}

/// Inbound frame a worker publishes to the reply destination.
#[derive(Debug, Deserialize)]
struct ReplyFrame {
    correlation_id: Option<String>,
    body: Value,
}

fn command_topic(route: &Route) -> String {
    format!("pylon/{}/{}", route.exchange, route.queue)
}

/// Dials a fresh broker connection per call.
pub struct MqttConnector {
    host: String,
    port: u16,
}

impl MqttConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Connector for MqttConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        let client_id = format!("pylon-cp-{}", Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(KEEP_ALIVE);
        let (client, eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        Ok(Box::new(MqttTransport {
            client,
            eventloop,
            reply_topic: None,
            pending: VecDeque::new(),
        }))
    }
}

/// One MQTT connection with at most one subscribed reply topic.
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    reply_topic: Option<String>,
    /// Publishes observed while waiting for a control packet.
    pending: VecDeque<rumqttc::Publish>,
}

#[async_trait]
impl Transport for MqttTransport {
    async fn open_reply(&mut self, reply_to: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(reply_to, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        // Drive the event loop until the broker acknowledges the
        // subscription; publishing before the SubAck could lose a fast reply.
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    self.reply_topic = Some(reply_to.to_string());
                    return Ok(());
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.pending.push_back(publish);
                }
                Ok(_) => {}
                Err(e) => return Err(TransportError::Connection(e.to_string())),
            }
        }
    }

    async fn publish(
        &mut self,
        route: &Route,
        props: &CallProperties,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let body: Value = serde_json::from_slice(payload)
            .map_err(|e| TransportError::Publish(e.to_string()))?;
        let frame = CommandFrame {
            correlation_id: &props.correlation_id,
            reply_to: &props.reply_to,
            body,
        };
        let bytes =
            serde_json::to_vec(&frame).map_err(|e| TransportError::Publish(e.to_string()))?;

        self.client
            .publish(command_topic(route), QoS::AtLeastOnce, false, bytes)
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Delivery, TransportError> {
        let topic = self
            .reply_topic
            .clone()
            .ok_or(TransportError::Closed)?;

        loop {
            let publish = if let Some(publish) = self.pending.pop_front() {
                publish
            } else {
                match self.eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => publish,
                    Ok(_) => continue,
                    Err(e) => return Err(TransportError::Connection(e.to_string())),
                }
            };

            if publish.topic != topic {
                continue;
            }

            match serde_json::from_slice::<ReplyFrame>(&publish.payload) {
                Ok(frame) => {
                    let payload = serde_json::to_vec(&frame.body)
                        .map_err(|e| TransportError::Connection(e.to_string()))?;
                    return Ok(Delivery {
                        correlation_id: frame.correlation_id,
                        payload,
                    });
                }
                // Not a reply frame at all: hand it up untagged so the
                // bridge discards it as uncorrelated.
                Err(_) => {
                    return Ok(Delivery {
                        correlation_id: None,
                        payload: publish.payload.to_vec(),
                    });
                }
            }
        }
    }

    async fn close_reply(&mut self, reply_to: &str) -> Result<(), TransportError> {
        self.reply_topic = None;
        self.pending.clear();
        self.client
            .unsubscribe(reply_to)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_wire::MessageType;

    #[test]
    fn test_command_topic_shape() {
        let route = MessageType::CreateContainer.route();
        assert_eq!(command_topic(&route), "pylon/container/create-container-queue");
    }

    #[test]
    fn test_reply_frame_without_correlation_parses() {
        let frame: ReplyFrame =
            serde_json::from_str(r#"{"body": [0, "", {}]}"#).unwrap();
        assert!(frame.correlation_id.is_none());
    }
}
