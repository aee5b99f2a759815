//! End-to-end orchestrator behavior against the in-memory broker and a
//! scripted worker: state transitions, orphaning, validation fail-fast, and
//! the scheduling boundary.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pylon_control_plane::cache::MemoryCache;
use pylon_control_plane::model::{Host, Resources};
use pylon_control_plane::orchestrator::{
    CreateRequest, Error, Orchestrator, OrchestratorOptions,
};
use pylon_control_plane::scheduler::ScheduleError;
use pylon_control_plane::store::memory::MemoryStore;
use pylon_control_plane::store::{ContainerFilter, ContainerStore, FlavorStore, HostStore};
use pylon_id::{ContainerId, FlavorId, HostId};
use pylon_testing::{replies, MemoryBroker, StubWorker};
use pylon_wire::{Command, Reply};

struct Rig {
    broker: MemoryBroker,
    store: Arc<MemoryStore>,
    orchestrator: Orchestrator,
}

fn rig_with_options(options: OrchestratorOptions) -> Rig {
    let broker = MemoryBroker::new();
    let store = Arc::new(MemoryStore::with_default_flavors());
    let orchestrator = Orchestrator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(broker.connector()),
        Arc::new(MemoryCache::new()),
        options,
    );
    Rig {
        broker,
        store,
        orchestrator,
    }
}

fn rig() -> Rig {
    rig_with_options(OrchestratorOptions {
        call_timeout: Duration::from_secs(2),
        serialize_container_ops: false,
    })
}

async fn add_host(store: &MemoryStore, capacity: Resources) -> HostId {
    let host = Host {
        id: HostId::new(),
        ip: "10.0.0.1".to_string(),
        port: 2375,
        alive: true,
        capacity,
        created_at: Utc::now(),
    };
    let id = host.id;
    HostStore::save(store, host).await.unwrap();
    id
}

fn roomy() -> Resources {
    Resources {
        cpu: 16,
        mem_mb: 32_768,
        sys_disk_mb: 1_048_576,
        volume_mb: 1_048_576,
        bandwidth_kb: 1_048_576,
    }
}

async fn small_flavor(store: &MemoryStore) -> FlavorId {
    FlavorStore::list(store)
        .await
        .unwrap()
        .into_iter()
        .find(|f| f.name == "small")
        .unwrap()
        .id
}

fn create_request(flavor: FlavorId, host: Option<HostId>) -> CreateRequest {
    CreateRequest {
        name: Some("web-1".to_string()),
        image: "ubuntu:latest".to_string(),
        flavor,
        user: "alice".to_string(),
        command: Some("/bin/bash".to_string()),
        hostname: None,
        ports: vec![80],
        host,
    }
}

#[tokio::test]
async fn create_binds_remote_identifier_and_activates() {
    let rig = rig();
    StubWorker::spawn(&rig.broker, |command| match command {
        Command::CreateContainer { .. } => replies::create_ok("abc123def456"),
        _ => Reply::ok(serde_json::json!({})),
    });
    let host = add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();

    assert!(container.create_status);
    assert_eq!(container.cid.as_deref(), Some("abc123def456"));
    assert_eq!(container.host, Some(host));
    assert_eq!(container.status, "Up Less than a second");
    assert_eq!(container.extra["cid"], "abc123def456");

    // The persisted row matches what the caller saw.
    let stored = ContainerStore::get(&*rig.store, container.id).await.unwrap();
    assert!(stored.create_status);
    assert_eq!(stored.cid, container.cid);
}

#[tokio::test]
async fn create_failure_orphans_the_row() {
    let rig = rig();
    StubWorker::spawn(&rig.broker, |_| Reply::failure(1, "no space"));
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let err = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap_err();
    match err {
        Error::Operation { status, message } => {
            assert_eq!(status, 1);
            assert_eq!(message, "no space");
        }
        other => panic!("expected Operation error, got {other:?}"),
    }

    let rows = ContainerStore::list(&*rig.store, &ContainerFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let orphan = &rows[0];
    assert!(!orphan.create_status);
    assert!(orphan.cid.is_none());
    assert!(orphan.host.is_none());
    assert_eq!(orphan.status, "pending");

    // The orphan is invisible to lifecycle operations: no broker traffic.
    let before = rig.broker.publish_count();
    let err = rig.orchestrator.start(orphan.id).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(rig.broker.publish_count(), before);
}

#[tokio::test]
async fn create_without_any_host_fails_scheduling_before_dispatch() {
    let rig = rig();
    let flavor = small_flavor(&rig.store).await;

    let err = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Scheduling(ScheduleError::NoEligibleHost)
    ));
    assert_eq!(rig.broker.publish_count(), 0);
    // Scheduling failures happen before anything is persisted.
    assert!(
        ContainerStore::list(&*rig.store, &ContainerFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn pinned_dead_host_is_rejected() {
    let rig = rig();
    let flavor = small_flavor(&rig.store).await;
    let host_id = add_host(&rig.store, roomy()).await;
    let mut host = HostStore::get(&*rig.store, host_id).await.unwrap();
    host.alive = false;
    HostStore::save(&*rig.store, host).await.unwrap();

    let err = rig
        .orchestrator
        .create(create_request(flavor, Some(host_id)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Scheduling(ScheduleError::HostUnavailable(_))
    ));
    assert_eq!(rig.broker.publish_count(), 0);
}

#[tokio::test]
async fn admission_boundary_is_capacity_exact() {
    let rig = rig();
    StubWorker::spawn_ok(&rig.broker);
    let flavor = small_flavor(&rig.store).await;
    // Room for exactly two "small" placements on every dimension.
    add_host(
        &rig.store,
        Resources {
            cpu: 2,
            mem_mb: 512,
            sys_disk_mb: 20_480,
            volume_mb: 0,
            bandwidth_kb: 2_048,
        },
    )
    .await;

    rig.orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();
    // 256 + 256 = 512 is an exact fit and must be admitted.
    rig.orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();
    let err = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Scheduling(ScheduleError::NoEligibleHost)
    ));
}

#[tokio::test]
async fn stop_mirrors_reply_status_string() {
    let rig = rig();
    StubWorker::spawn(&rig.broker, |command| match command {
        Command::CreateContainer { .. } => replies::create_ok("abc123def456"),
        Command::StopContainer { .. } => replies::status_ok("Exited (0) 1 second ago"),
        _ => Reply::ok(serde_json::json!({})),
    });
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();
    let stopped = rig.orchestrator.stop(container.id).await.unwrap();
    assert_eq!(stopped.status, "Exited (0) 1 second ago");
}

#[tokio::test]
async fn repeated_delete_fails_cleanly() {
    let rig = rig();
    StubWorker::spawn_ok(&rig.broker);
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();
    rig.orchestrator.delete(container.id).await.unwrap();

    let err = rig.orchestrator.delete(container.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));

    // create + delete only; the second delete never reached the broker.
    assert_eq!(rig.broker.publish_count(), 2);
    let rows = ContainerStore::list(&*rig.store, &ContainerFilter::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn deleting_an_orphan_is_local_cleanup() {
    let rig = rig();
    StubWorker::spawn(&rig.broker, |_| Reply::failure(1, "no space"));
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let _ = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap_err();
    let orphan = ContainerStore::list(&*rig.store, &ContainerFilter::default())
        .await
        .unwrap()
        .remove(0);

    let before = rig.broker.publish_count();
    rig.orchestrator.delete(orphan.id).await.unwrap();
    assert_eq!(rig.broker.publish_count(), before);
    assert!(
        ContainerStore::list(&*rig.store, &ContainerFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn validation_failures_never_dispatch() {
    let rig = rig();
    StubWorker::spawn_ok(&rig.broker);
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;

    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();
    let before = rig.broker.publish_count();

    let err = rig
        .orchestrator
        .exec(container.id, "   ".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = rig
        .orchestrator
        .dirs_create(container.id, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = rig
        .orchestrator
        .host_exec(container.id, vec![], "alice".to_string(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert_eq!(rig.broker.publish_count(), before);
}

#[tokio::test]
async fn unknown_container_is_not_found() {
    let rig = rig();
    let err = rig.orchestrator.start(ContainerId::new()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound));
    assert_eq!(rig.broker.publish_count(), 0);
}

#[tokio::test]
async fn console_url_is_served_from_cache_on_repeat() {
    let rig = rig();
    StubWorker::spawn(&rig.broker, |command| match command {
        Command::CreateContainer { .. } => replies::create_ok("abc123def456"),
        Command::ConsoleContainer { .. } => {
            replies::console_ok("https://console.example/s/abc123")
        }
        _ => Reply::ok(serde_json::json!({})),
    });
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;
    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();

    let first = rig
        .orchestrator
        .console(container.id, "bash".to_string(), "alice".to_string())
        .await
        .unwrap();
    let after_first = rig.broker.publish_count();

    let second = rig
        .orchestrator
        .console(container.id, "bash".to_string(), "alice".to_string())
        .await
        .unwrap();
    assert_eq!(first, second);
    // The repeat was answered from the cache without broker traffic.
    assert_eq!(rig.broker.publish_count(), after_first);
}

#[tokio::test]
async fn serialized_ops_still_complete_concurrently() {
    let rig = rig_with_options(OrchestratorOptions {
        call_timeout: Duration::from_secs(2),
        serialize_container_ops: true,
    });
    StubWorker::spawn_ok(&rig.broker);
    add_host(&rig.store, roomy()).await;
    let flavor = small_flavor(&rig.store).await;
    let container = rig
        .orchestrator
        .create(create_request(flavor, None))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        rig.orchestrator.stop(container.id),
        rig.orchestrator.start(container.id),
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
}
