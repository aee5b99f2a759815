//! Placement scheduler.
//!
//! Pure computation over host and container state: no I/O, no shared mutable
//! state, safe to call from any number of concurrent requests. The selection
//! policy is first-fit over live hosts enumerated in ascending `HostId`
//! order; identical inputs always produce the identical choice.

use std::collections::HashMap;

use pylon_id::{FlavorId, HostId};
use thiserror::Error;

use crate::model::{Container, Flavor, Host, Resources};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no live host can satisfy the requested capacity")]
    NoEligibleHost,

    #[error("host {0} is not accepting placements")]
    HostUnavailable(HostId),
}

/// Sums the flavor demand of every container assigned to each host.
///
/// Containers without an assigned host contribute nothing; a container whose
/// flavor is no longer in the catalog is skipped rather than guessed at.
pub fn committed_by_host(
    containers: &[Container],
    flavors: &[Flavor],
) -> HashMap<HostId, Resources> {
    let catalog: HashMap<FlavorId, &Resources> =
        flavors.iter().map(|f| (f.id, &f.resources)).collect();

    let mut committed: HashMap<HostId, Resources> = HashMap::new();
    for container in containers {
        let Some(host) = container.host else {
            continue;
        };
        let Some(demand) = catalog.get(&container.flavor) else {
            continue;
        };
        committed.entry(host).or_default().accumulate(demand);
    }
    committed
}

/// Picks the first live host whose remaining capacity covers `demand` on
/// every dimension. The boundary is inclusive: a placement that lands
/// exactly on capacity is admitted.
pub fn select_host<'a>(
    demand: &Resources,
    hosts: &'a [Host],
    committed: &HashMap<HostId, Resources>,
) -> Result<&'a Host, ScheduleError> {
    let mut live: Vec<&Host> = hosts.iter().filter(|h| h.alive).collect();
    live.sort_by_key(|h| h.id);

    for host in live {
        let used = committed.get(&host.id).copied().unwrap_or_default();
        if used.plus(demand).fits_within(&host.capacity) {
            return Ok(host);
        }
    }
    Err(ScheduleError::NoEligibleHost)
}
