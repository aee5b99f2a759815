//! Domain types: hosts, flavors, containers, resource accounting.

use chrono::{DateTime, Utc};
use pylon_id::{ContainerId, FlavorId, HostId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status string for a row created before its create command was dispatched
/// or confirmed.
pub const STATUS_PENDING: &str = "pending";

/// Aggregate resource quantities, used both for host capacity and for flavor
/// demand. Units follow the flavor catalog: cores, megabytes for memory and
/// disk, kilobytes per second for bandwidth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: i64,
    pub mem_mb: i64,
    pub sys_disk_mb: i64,
    pub volume_mb: i64,
    pub bandwidth_kb: i64,
}

impl Resources {
    /// All dimensions non-negative.
    pub fn is_valid(&self) -> bool {
        self.cpu >= 0
            && self.mem_mb >= 0
            && self.sys_disk_mb >= 0
            && self.volume_mb >= 0
            && self.bandwidth_kb >= 0
    }

    /// Dimension-wise sum.
    pub fn plus(&self, other: &Resources) -> Resources {
        Resources {
            cpu: self.cpu + other.cpu,
            mem_mb: self.mem_mb + other.mem_mb,
            sys_disk_mb: self.sys_disk_mb + other.sys_disk_mb,
            volume_mb: self.volume_mb + other.volume_mb,
            bandwidth_kb: self.bandwidth_kb + other.bandwidth_kb,
        }
    }

    /// Adds `other` into `self`, dimension-wise.
    pub fn accumulate(&mut self, other: &Resources) {
        *self = self.plus(other);
    }

    /// True when every dimension of `self` fits within `capacity`. The
    /// boundary is inclusive: an exact capacity match fits.
    pub fn fits_within(&self, capacity: &Resources) -> bool {
        self.cpu <= capacity.cpu
            && self.mem_mb <= capacity.mem_mb
            && self.sys_disk_mb <= capacity.sys_disk_mb
            && self.volume_mb <= capacity.volume_mb
            && self.bandwidth_kb <= capacity.bandwidth_kb
    }
}

/// A managed machine running a container engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub ip: String,
    pub port: u16,
    /// Hosts with `alive == false` are never eligible for placement.
    pub alive: bool,
    pub capacity: Resources,
    pub created_at: DateTime<Utc>,
}

/// A named resource profile describing a container's demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub id: FlavorId,
    pub name: String,
    pub resources: Resources,
}

/// The stock catalog shipped with the control plane. Deployments can add
/// their own flavors through the API.
pub fn default_flavors() -> Vec<Flavor> {
    vec![
        Flavor {
            id: FlavorId::new(),
            name: "tiny".to_string(),
            resources: Resources {
                cpu: 1,
                mem_mb: 128,
                sys_disk_mb: 5120,
                volume_mb: 0,
                bandwidth_kb: 512,
            },
        },
        Flavor {
            id: FlavorId::new(),
            name: "small".to_string(),
            resources: Resources {
                cpu: 1,
                mem_mb: 256,
                sys_disk_mb: 10240,
                volume_mb: 0,
                bandwidth_kb: 1024,
            },
        },
        Flavor {
            id: FlavorId::new(),
            name: "standard".to_string(),
            resources: Resources {
                cpu: 1,
                mem_mb: 512,
                sys_disk_mb: 10240,
                volume_mb: 0,
                bandwidth_kb: 1024,
            },
        },
    ]
}

/// A running or pending unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    /// Remote identifier assigned by the worker. `None` until remote
    /// creation is confirmed.
    pub cid: Option<String>,
    /// Assigned host. `None` while scheduling is pending or creation failed.
    pub host: Option<HostId>,
    pub flavor: FlavorId,
    pub user: String,
    pub image: String,
    pub name: Option<String>,
    pub command: Option<String>,
    pub hostname: Option<String>,
    pub ports: Vec<u16>,
    /// Advisory status string mirrored from worker replies.
    pub status: String,
    /// True only after a successful create reply bound `cid`.
    pub create_status: bool,
    /// Opaque metadata blob, last create reply payload.
    pub extra: Value,
    pub created_at: DateTime<Utc>,
}

impl Container {
    /// A fresh row in the pending state, before any dispatch.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        flavor: FlavorId,
        user: String,
        image: String,
        name: Option<String>,
        command: Option<String>,
        hostname: Option<String>,
        ports: Vec<u16>,
    ) -> Self {
        Self {
            id: ContainerId::new(),
            cid: None,
            host: None,
            flavor,
            user,
            image,
            name,
            command,
            hostname,
            ports,
            status: STATUS_PENDING.to_string(),
            create_status: false,
            extra: Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Whether lifecycle operations may address this container on a host.
    pub fn is_addressable(&self) -> bool {
        self.create_status && self.cid.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_within_is_inclusive() {
        let capacity = Resources {
            cpu: 2,
            mem_mb: 512,
            sys_disk_mb: 10240,
            volume_mb: 0,
            bandwidth_kb: 1024,
        };
        assert!(capacity.fits_within(&capacity));
    }

    #[test]
    fn test_fits_within_fails_on_any_dimension() {
        let capacity = Resources {
            cpu: 4,
            mem_mb: 1024,
            sys_disk_mb: 10240,
            volume_mb: 1024,
            bandwidth_kb: 1024,
        };
        let demand = Resources {
            mem_mb: 1025,
            ..Resources::default()
        };
        assert!(!demand.fits_within(&capacity));
    }

    #[test]
    fn test_pending_container_is_not_addressable() {
        let container = Container::pending(
            FlavorId::new(),
            "alice".into(),
            "ubuntu:latest".into(),
            None,
            None,
            None,
            vec![],
        );
        assert!(!container.is_addressable());
        assert_eq!(container.status, STATUS_PENDING);
        assert!(container.host.is_none());
    }

    #[test]
    fn test_default_catalog_profiles() {
        let flavors = default_flavors();
        assert_eq!(flavors.len(), 3);
        assert!(flavors.iter().all(|f| f.resources.is_valid()));
        let small = flavors.iter().find(|f| f.name == "small").unwrap();
        assert_eq!(small.resources.mem_mb, 256);
    }
}
