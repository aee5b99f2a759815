//! Container lifecycle orchestrator.
//!
//! Sequences the per-operation protocol: validate the caller's input,
//! resolve placement when needed, build the command envelope, run the bridge
//! round trip, interpret the reply, and hand the outcome to persistence.
//! State only advances on a worker-confirmed reply (`status == 0`); the one
//! exception is the pending create row, which is written before dispatch so
//! a failed or lost create leaves an auditable orphan.

mod exec;
mod lifecycle;

pub use lifecycle::CreateRequest;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pylon_id::ContainerId;
use pylon_wire::{Command, Connector, EnvelopeError, Reply, Target, TransportError};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::bridge::{Bridge, BridgeError};
use crate::cache::ConsoleCache;
use crate::model::Container;
use crate::scheduler::ScheduleError;
use crate::store::{ContainerStore, FlavorStore, HostStore, StoreError};

/// Failures surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing caller input. Never dispatched.
    #[error("{0}")]
    Validation(String),

    /// The addressed container does not exist.
    #[error("container not found")]
    NotFound,

    /// No host could take the placement.
    #[error(transparent)]
    Scheduling(#[from] ScheduleError),

    /// Broker-level failure: transport, protocol, or timeout.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The worker reported a non-zero status for the operation.
    #[error("{message}")]
    Operation { status: i64, message: String },

    /// The persistence collaborator failed.
    #[error("storage backend failure: {0}")]
    Storage(String),
}

impl From<EnvelopeError> for Error {
    fn from(e: EnvelopeError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Bridge(BridgeError::Transport(e))
    }
}

pub(crate) fn store_err(e: StoreError) -> Error {
    match e {
        StoreError::NotFound => Error::NotFound,
        StoreError::Backend(message) => Error::Storage(message),
    }
}

/// Tuning knobs, all env-driven in production.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Upper bound on one bridge round trip.
    pub call_timeout: Duration,
    /// Opt-in per-container mutual exclusion around dispatch and reply
    /// interpretation. Off by default; concurrent operations on one
    /// container are otherwise allowed to race, as callers may rely on.
    pub serialize_container_ops: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            serialize_container_ops: false,
        }
    }
}

/// Per-container operation locks, allocated lazily.
#[derive(Default)]
struct OpLocks {
    map: Mutex<HashMap<ContainerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl OpLocks {
    async fn acquire(&self, id: ContainerId) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = { self.map.lock().entry(id).or_default().clone() };
        mutex.lock_owned().await
    }
}

pub struct Orchestrator {
    containers: Arc<dyn ContainerStore>,
    hosts: Arc<dyn HostStore>,
    flavors: Arc<dyn FlavorStore>,
    connector: Arc<dyn Connector>,
    console_cache: Arc<dyn ConsoleCache>,
    options: OrchestratorOptions,
    locks: OpLocks,
}

impl Orchestrator {
    pub fn new(
        containers: Arc<dyn ContainerStore>,
        hosts: Arc<dyn HostStore>,
        flavors: Arc<dyn FlavorStore>,
        connector: Arc<dyn Connector>,
        console_cache: Arc<dyn ConsoleCache>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            containers,
            hosts,
            flavors,
            connector,
            console_cache,
            options,
            locks: OpLocks::default(),
        }
    }

    pub(crate) fn containers(&self) -> &Arc<dyn ContainerStore> {
        &self.containers
    }

    pub(crate) fn hosts(&self) -> &Arc<dyn HostStore> {
        &self.hosts
    }

    pub(crate) fn flavors(&self) -> &Arc<dyn FlavorStore> {
        &self.flavors
    }

    pub(crate) fn console_cache(&self) -> &Arc<dyn ConsoleCache> {
        &self.console_cache
    }

    /// Takes the per-container lock when serialization is enabled.
    pub(crate) async fn op_guard(
        &self,
        id: ContainerId,
    ) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        if self.options.serialize_container_ops {
            Some(self.locks.acquire(id).await)
        } else {
            None
        }
    }

    /// Loads a container and proves it is addressable on a host. Rows still
    /// pending remote creation (or orphaned by a failed create) are rejected
    /// here, before any broker traffic.
    pub(crate) async fn load_addressable(
        &self,
        id: ContainerId,
    ) -> Result<(Container, Target), Error> {
        let container = self.containers.get(id).await.map_err(store_err)?;
        let cid = container
            .cid
            .clone()
            .filter(|_| container.create_status)
            .ok_or_else(|| {
                Error::Validation("container has not completed remote creation".to_string())
            })?;
        Ok((container, Target { id, cid }))
    }

    /// One full round trip: fresh connection, fresh bridge, correlated call.
    /// Worker-reported failures become [`Error::Operation`]; the reply is
    /// returned only when `status == 0`.
    pub(crate) async fn dispatch(&self, command: &Command) -> Result<Reply, Error> {
        let transport = self.connector.connect().await?;
        let mut bridge = Bridge::new(transport, self.options.call_timeout);
        let reply = bridge.call(command).await?;
        if !reply.is_ok() {
            warn!(
                message_type = %command.message_type(),
                status = reply.status,
                message = %reply.message,
                "worker rejected operation"
            );
            return Err(Error::Operation {
                status: reply.status,
                message: reply.message,
            });
        }
        Ok(reply)
    }
}

/// Status string returned by the reply when it carries one, else the
/// operation's conventional result state.
pub(crate) fn mirrored_status(reply: &Reply, fallback: &str) -> String {
    reply
        .result
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
