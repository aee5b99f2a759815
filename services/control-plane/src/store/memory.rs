//! In-memory store used by tests and dev mode.

use std::collections::HashMap;
use parking_lot::RwLock;

use async_trait::async_trait;
use pylon_id::{ContainerId, FlavorId, HostId};

use crate::model::{default_flavors, Container, Flavor, Host};
use crate::store::{ContainerFilter, ContainerStore, FlavorStore, HostStore, StoreError};

/// One store implementing all three collaborator interfaces.
pub struct MemoryStore {
    containers: RwLock<HashMap<ContainerId, Container>>,
    hosts: RwLock<HashMap<HostId, Host>>,
    flavors: RwLock<HashMap<FlavorId, Flavor>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            hosts: RwLock::new(HashMap::new()),
            flavors: RwLock::new(HashMap::new()),
        }
    }

    /// A store pre-seeded with the stock flavor catalog.
    pub fn with_default_flavors() -> Self {
        let store = Self::new();
        {
            let mut flavors = store.flavors.write();
            for flavor in default_flavors() {
                flavors.insert(flavor.id, flavor);
            }
        }
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerStore for MemoryStore {
    async fn get(&self, id: ContainerId) -> Result<Container, StoreError> {
        self.containers
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ContainerFilter) -> Result<Vec<Container>, StoreError> {
        let mut items: Vec<Container> = self
            .containers
            .read()
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        items.sort_by_key(|c| c.id);
        Ok(items)
    }

    async fn save(&self, container: Container) -> Result<(), StoreError> {
        self.containers
            .write()
            .insert(container.id, container);
        Ok(())
    }

    async fn delete(&self, id: ContainerId) -> Result<(), StoreError> {
        match self.containers.write().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl HostStore for MemoryStore {
    async fn get(&self, id: HostId) -> Result<Host, StoreError> {
        self.hosts
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Host>, StoreError> {
        let mut items: Vec<Host> = self.hosts.read().values().cloned().collect();
        items.sort_by_key(|h| h.id);
        Ok(items)
    }

    async fn save(&self, host: Host) -> Result<(), StoreError> {
        self.hosts.write().insert(host.id, host);
        Ok(())
    }

    async fn delete(&self, id: HostId) -> Result<(), StoreError> {
        match self.hosts.write().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl FlavorStore for MemoryStore {
    async fn get(&self, id: FlavorId) -> Result<Flavor, StoreError> {
        self.flavors
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Flavor>, StoreError> {
        let mut items: Vec<Flavor> = self.flavors.read().values().cloned().collect();
        items.sort_by_key(|f| f.id);
        Ok(items)
    }

    async fn save(&self, flavor: Flavor) -> Result<(), StoreError> {
        self.flavors.write().insert(flavor.id, flavor);
        Ok(())
    }
}
