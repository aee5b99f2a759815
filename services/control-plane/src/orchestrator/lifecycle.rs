//! Create, state transitions, and delete.

use pylon_id::{ContainerId, FlavorId, HostId};
use pylon_wire::{Command, CreateSpec, Target};
use serde_json::Value;
use tracing::{info, warn};

use crate::bridge::BridgeError;
use crate::model::{Container, Host, Resources};
use crate::orchestrator::{mirrored_status, store_err, Error, Orchestrator};
use crate::scheduler::{committed_by_host, select_host, ScheduleError};
use crate::store::ContainerFilter;

/// Caller input for a create operation.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: Option<String>,
    pub image: String,
    pub flavor: FlavorId,
    pub user: String,
    pub command: Option<String>,
    pub hostname: Option<String>,
    pub ports: Vec<u16>,
    /// Pinned placement target. `None` asks the scheduler.
    pub host: Option<HostId>,
}

impl Orchestrator {
    /// Creates a container: validate, resolve placement, persist a pending
    /// row, run the create round trip, then bind the remote identifier.
    ///
    /// Validation and scheduling failures happen before anything is
    /// persisted. Once the row exists, a dispatch failure leaves it orphaned
    /// with `create_status == false`; it stays invisible to lifecycle
    /// operations until a repeat create or an administrative delete.
    pub async fn create(&self, request: CreateRequest) -> Result<Container, Error> {
        let flavor = self
            .flavors()
            .get(request.flavor)
            .await
            .map_err(|_| Error::Validation(format!("unknown flavor {}", request.flavor)))?;

        if request.image.trim().is_empty() {
            return Err(Error::Validation("field 'image' must not be empty".to_string()));
        }
        if request.user.trim().is_empty() {
            return Err(Error::Validation("field 'user' must not be empty".to_string()));
        }

        let host = self.place(&flavor.resources, request.host).await?;

        let mut container = Container::pending(
            request.flavor,
            request.user.clone(),
            request.image.clone(),
            request.name.clone(),
            request.command.clone(),
            request.hostname.clone(),
            request.ports.clone(),
        );

        let command = Command::create(CreateSpec {
            id: container.id,
            name: request.name,
            image: request.image,
            flavor: request.flavor,
            user: request.user,
            command: request.command,
            hostname: request.hostname,
            ports: request.ports,
            host_ip: host.ip.clone(),
            host_port: host.port,
        })?;

        // The pending row exists before dispatch: a lost or failed create
        // leaves an auditable orphan rather than a phantom.
        self.containers()
            .save(container.clone())
            .await
            .map_err(store_err)?;

        let _guard = self.op_guard(container.id).await;
        let reply = match self.dispatch(&command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    container_id = %container.id,
                    error = %e,
                    "create dispatch failed, row orphaned"
                );
                return Err(e);
            }
        };

        let cid = reply
            .result
            .get("cid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::Bridge(BridgeError::Protocol(
                    "create reply missing 'cid'".to_string(),
                ))
            })?
            .to_string();

        container.cid = Some(cid.clone());
        container.host = Some(host.id);
        container.status = mirrored_status(&reply, "running");
        container.create_status = true;
        container.extra = reply.result.clone();
        self.containers()
            .save(container.clone())
            .await
            .map_err(store_err)?;

        info!(
            container_id = %container.id,
            cid = %cid,
            host_id = %host.id,
            "container created"
        );
        Ok(container)
    }

    pub async fn start(&self, id: ContainerId) -> Result<Container, Error> {
        self.transition(id, Command::start, "running").await
    }

    pub async fn stop(&self, id: ContainerId) -> Result<Container, Error> {
        self.transition(id, Command::stop, "stopped").await
    }

    pub async fn restart(&self, id: ContainerId) -> Result<Container, Error> {
        self.transition(id, Command::restart, "running").await
    }

    pub async fn pause(&self, id: ContainerId) -> Result<Container, Error> {
        self.transition(id, Command::pause, "paused").await
    }

    pub async fn unpause(&self, id: ContainerId) -> Result<Container, Error> {
        self.transition(id, Command::unpause, "running").await
    }

    /// Deletes a container. Confirmed containers are torn down at the worker
    /// first; orphaned rows (creation never confirmed) have nothing remote
    /// to tear down and are removed directly, which is the administrative
    /// cleanup path for failed creates.
    pub async fn delete(&self, id: ContainerId) -> Result<(), Error> {
        let _guard = self.op_guard(id).await;
        let container = self.containers().get(id).await.map_err(store_err)?;
        if let Some(cid) = container.cid.filter(|_| container.create_status) {
            self.dispatch(&Command::delete(&Target { id, cid })).await?;
        }
        self.containers().delete(id).await.map_err(store_err)?;
        info!(container_id = %id, "container deleted");
        Ok(())
    }

    /// Shared path for state transitions that only mirror a status string.
    async fn transition(
        &self,
        id: ContainerId,
        build: fn(&Target) -> Command,
        fallback_status: &str,
    ) -> Result<Container, Error> {
        let _guard = self.op_guard(id).await;
        let (mut container, target) = self.load_addressable(id).await?;
        let reply = self.dispatch(&build(&target)).await?;
        container.status = mirrored_status(&reply, fallback_status);
        self.containers()
            .save(container.clone())
            .await
            .map_err(store_err)?;
        Ok(container)
    }

    /// Resolves the placement target: the pinned host when the caller chose
    /// one, otherwise first-fit over live hosts with committed demand
    /// subtracted.
    async fn place(&self, demand: &Resources, pinned: Option<HostId>) -> Result<Host, Error> {
        match pinned {
            Some(id) => {
                let host = self
                    .hosts()
                    .get(id)
                    .await
                    .map_err(|_| Error::Validation(format!("unknown host {id}")))?;
                if !host.alive {
                    return Err(Error::Scheduling(ScheduleError::HostUnavailable(id)));
                }
                Ok(host)
            }
            None => {
                let hosts = self.hosts().list().await.map_err(store_err)?;
                let flavors = self.flavors().list().await.map_err(store_err)?;
                let containers = self
                    .containers()
                    .list(&ContainerFilter::default())
                    .await
                    .map_err(store_err)?;
                let committed = committed_by_host(&containers, &flavors);
                let host = select_host(demand, &hosts, &committed)?;
                Ok(host.clone())
            }
        }
    }
}
