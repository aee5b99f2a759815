//! Application state shared across request handlers.

use std::sync::Arc;

use pylon_wire::Connector;

use crate::cache::MemoryCache;
use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::store::memory::MemoryStore;
use crate::store::{ContainerStore, FlavorStore, HostStore};

/// Shared application state, passed to all request handlers via axum's state
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    orchestrator: Orchestrator,
    containers: Arc<dyn ContainerStore>,
    hosts: Arc<dyn HostStore>,
    flavors: Arc<dyn FlavorStore>,
}

impl AppState {
    pub fn new(
        orchestrator: Orchestrator,
        containers: Arc<dyn ContainerStore>,
        hosts: Arc<dyn HostStore>,
        flavors: Arc<dyn FlavorStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orchestrator,
                containers,
                hosts,
                flavors,
            }),
        }
    }

    /// State backed by the in-memory store, pre-seeded with the stock flavor
    /// catalog. Used by the binary and by integration tests.
    pub fn in_memory(connector: Arc<dyn Connector>, options: OrchestratorOptions) -> Self {
        let store = Arc::new(MemoryStore::with_default_flavors());
        let containers: Arc<dyn ContainerStore> = store.clone();
        let hosts: Arc<dyn HostStore> = store.clone();
        let flavors: Arc<dyn FlavorStore> = store;
        let orchestrator = Orchestrator::new(
            containers.clone(),
            hosts.clone(),
            flavors.clone(),
            connector,
            Arc::new(MemoryCache::new()),
            options,
        );
        Self::new(orchestrator, containers, hosts, flavors)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    pub fn containers(&self) -> &Arc<dyn ContainerStore> {
        &self.inner.containers
    }

    pub fn hosts(&self) -> &Arc<dyn HostStore> {
        &self.inner.hosts
    }

    pub fn flavors(&self) -> &Arc<dyn FlavorStore> {
        &self.inner.flavors
    }
}
