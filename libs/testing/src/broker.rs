//! In-memory broker with the same visible behavior as a real one: commands
//! published to a route are buffered for whoever consumes the command
//! stream, replies are delivered only to an open reply destination, and
//! publishing to a queue nobody consumes is not an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pylon_wire::{CallProperties, Connector, Delivery, Route, Transport, TransportError};
use tokio::sync::mpsc;

/// A command observed by the broker, with its correlation metadata.
#[derive(Debug, Clone)]
pub struct PublishedCommand {
    pub route: Route,
    pub props: CallProperties,
    pub payload: Vec<u8>,
}

struct BrokerInner {
    replies: HashMap<String, mpsc::UnboundedSender<Delivery>>,
    commands_tx: mpsc::UnboundedSender<PublishedCommand>,
    commands_rx: Option<mpsc::UnboundedReceiver<PublishedCommand>>,
    published: u64,
}

/// Shared in-memory broker handle.
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<Mutex<BrokerInner>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Mutex::new(BrokerInner {
                replies: HashMap::new(),
                commands_tx,
                commands_rx: Some(commands_rx),
                published: 0,
            })),
        }
    }

    /// Takes the single command stream. `None` if already taken.
    pub fn take_commands(&self) -> Option<mpsc::UnboundedReceiver<PublishedCommand>> {
        self.inner.lock().unwrap().commands_rx.take()
    }

    /// Total number of commands ever published.
    pub fn publish_count(&self) -> u64 {
        self.inner.lock().unwrap().published
    }

    /// Number of reply destinations currently open. Should return to zero
    /// once every call has released its destination.
    pub fn open_reply_destinations(&self) -> usize {
        self.inner.lock().unwrap().replies.len()
    }

    /// Delivers a raw payload to an open reply destination. Returns false if
    /// the destination is not open (the message is dropped, as a real broker
    /// drops messages for deleted queues).
    pub fn inject_reply(
        &self,
        reply_to: &str,
        correlation_id: Option<&str>,
        payload: Vec<u8>,
    ) -> bool {
        let inner = self.inner.lock().unwrap();
        match inner.replies.get(reply_to) {
            Some(tx) => tx
                .send(Delivery {
                    correlation_id: correlation_id.map(str::to_string),
                    payload,
                })
                .is_ok(),
            None => false,
        }
    }

    /// A connector producing fresh transports bound to this broker.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            broker: self.clone(),
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// One in-memory connection with at most one open reply destination.
pub struct MemoryTransport {
    broker: MemoryBroker,
    reply: Option<(String, mpsc::UnboundedReceiver<Delivery>)>,
}

impl MemoryTransport {
    pub fn new(broker: MemoryBroker) -> Self {
        Self {
            broker,
            reply: None,
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open_reply(&mut self, reply_to: &str) -> Result<(), TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.broker
            .inner
            .lock()
            .unwrap()
            .replies
            .insert(reply_to.to_string(), tx);
        self.reply = Some((reply_to.to_string(), rx));
        Ok(())
    }

    async fn publish(
        &mut self,
        route: &Route,
        props: &CallProperties,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let mut inner = self.broker.inner.lock().unwrap();
        inner.published += 1;
        inner
            .commands_tx
            .send(PublishedCommand {
                route: route.clone(),
                props: props.clone(),
                payload: payload.to_vec(),
            })
            .map_err(|e| TransportError::Publish(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Delivery, TransportError> {
        let (_, rx) = self.reply.as_mut().ok_or(TransportError::Closed)?;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn close_reply(&mut self, reply_to: &str) -> Result<(), TransportError> {
        self.broker
            .inner
            .lock()
            .unwrap()
            .replies
            .remove(reply_to);
        self.reply = None;
        Ok(())
    }
}

/// Connector handing out [`MemoryTransport`]s.
pub struct MemoryConnector {
    broker: MemoryBroker,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(MemoryTransport::new(self.broker.clone())))
    }
}
