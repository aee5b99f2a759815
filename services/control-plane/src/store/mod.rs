//! Persistence seams.
//!
//! Storage is an external collaborator: the control plane consumes these
//! narrow interfaces and does not own a schema. Lookups return an explicit
//! `NotFound` result instead of signalling absence through panics or
//! sentinel values. The in-memory implementation backs tests and dev mode.

pub mod memory;

use async_trait::async_trait;
use pylon_id::{ContainerId, FlavorId, HostId};
use thiserror::Error;

use crate::model::{Container, Flavor, Host};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Field-equality filter for container listings.
#[derive(Debug, Default, Clone)]
pub struct ContainerFilter {
    pub host: Option<HostId>,
    pub user: Option<String>,
    pub status: Option<String>,
    pub cid: Option<String>,
    pub name: Option<String>,
}

impl ContainerFilter {
    pub fn matches(&self, container: &Container) -> bool {
        if let Some(host) = self.host {
            if container.host != Some(host) {
                return false;
            }
        }
        if let Some(user) = &self.user {
            if &container.user != user {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &container.status != status {
                return false;
            }
        }
        if let Some(cid) = &self.cid {
            if container.cid.as_deref() != Some(cid.as_str()) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if container.name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait ContainerStore: Send + Sync {
    async fn get(&self, id: ContainerId) -> Result<Container, StoreError>;
    async fn list(&self, filter: &ContainerFilter) -> Result<Vec<Container>, StoreError>;
    async fn save(&self, container: Container) -> Result<(), StoreError>;
    async fn delete(&self, id: ContainerId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HostStore: Send + Sync {
    async fn get(&self, id: HostId) -> Result<Host, StoreError>;
    async fn list(&self) -> Result<Vec<Host>, StoreError>;
    async fn save(&self, host: Host) -> Result<(), StoreError>;
    async fn delete(&self, id: HostId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FlavorStore: Send + Sync {
    async fn get(&self, id: FlavorId) -> Result<Flavor, StoreError>;
    async fn list(&self) -> Result<Vec<Flavor>, StoreError>;
    async fn save(&self, flavor: Flavor) -> Result<(), StoreError>;
}
