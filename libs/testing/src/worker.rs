//! Scripted stand-in for a container worker.

use pylon_wire::{Command, Reply};

use crate::broker::MemoryBroker;

/// Consumes every command published to the broker and answers it through the
/// caller-provided handler, echoing the correlation identifier the way a
/// real worker does.
pub struct StubWorker;

impl StubWorker {
    /// Spawns the worker loop. Panics if the broker's command stream was
    /// already taken by another consumer.
    pub fn spawn<F>(broker: &MemoryBroker, handler: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(&Command) -> Reply + Send + Sync + 'static,
    {
        let mut commands = broker
            .take_commands()
            .expect("broker command stream already taken");
        let broker = broker.clone();
        tokio::spawn(async move {
            while let Some(msg) = commands.recv().await {
                let Ok(command) = serde_json::from_slice::<Command>(&msg.payload) else {
                    continue;
                };
                let reply = handler(&command);
                let payload = serde_json::to_vec(&reply).expect("reply serializes");
                broker.inject_reply(
                    &msg.props.reply_to,
                    Some(&msg.props.correlation_id),
                    payload,
                );
            }
        })
    }

    /// A worker that acknowledges everything with an empty success payload.
    /// Create commands get a synthetic remote identifier so lifecycle flows
    /// can proceed.
    pub fn spawn_ok(broker: &MemoryBroker) -> tokio::task::JoinHandle<()> {
        Self::spawn(broker, |command| match command {
            Command::CreateContainer { .. } => crate::replies::create_ok("f00dfeed9876"),
            _ => Reply::ok(serde_json::json!({})),
        })
    }
}
