//! HTTP surface test: the full stack from request decoding through the
//! orchestrator, bridge, and in-memory broker, against a scripted worker.

use std::sync::Arc;
use std::time::Duration;

use pylon_control_plane::{
    api,
    orchestrator::OrchestratorOptions,
    state::AppState,
};
use pylon_testing::{replies, MemoryBroker, StubWorker};
use pylon_wire::{Command, Reply};
use tokio::net::TcpListener;

async fn serve(state: AppState) -> String {
    let app = api::create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn scripted_worker(broker: &MemoryBroker) {
    StubWorker::spawn(broker, |command| match command {
        Command::CreateContainer { image, .. } if image == "registry/full:latest" => {
            Reply::failure(1, "no space")
        }
        Command::CreateContainer { .. } => replies::create_ok("abc123def456"),
        Command::StopContainer { .. } => replies::status_ok("stopped"),
        Command::TopContainer { .. } => replies::top_ok(),
        Command::ConsoleContainer { .. } => {
            replies::console_ok("https://console.example/s/abc123")
        }
        _ => Reply::ok(serde_json::json!({})),
    });
}

async fn rig() -> (MemoryBroker, String, reqwest::Client) {
    let broker = MemoryBroker::new();
    scripted_worker(&broker);
    let state = AppState::in_memory(
        Arc::new(broker.connector()),
        OrchestratorOptions {
            call_timeout: Duration::from_secs(2),
            serialize_container_ops: false,
        },
    );
    let base_url = serve(state).await;
    (broker, base_url, reqwest::Client::new())
}

async fn setup_host_and_flavor(
    client: &reqwest::Client,
    base_url: &str,
) -> (String, String) {
    let resp = client
        .post(format!("{base_url}/v1/hosts"))
        .json(&serde_json::json!({
            "ip": "10.0.0.1",
            "port": 2375,
            "capacity": {
                "cpu": 16,
                "mem_mb": 32768,
                "sys_disk_mb": 1048576,
                "volume_mb": 1048576,
                "bandwidth_kb": 1048576
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let host: serde_json::Value = resp.json().await.unwrap();
    let host_id = host["id"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("{base_url}/v1/flavors"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let flavors: serde_json::Value = resp.json().await.unwrap();
    let flavor_id = flavors["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "small")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    (host_id, flavor_id)
}

#[tokio::test]
async fn container_lifecycle_over_http() {
    let (_broker, base_url, client) = rig().await;
    let (_host_id, flavor_id) = setup_host_and_flavor(&client, &base_url).await;

    // Create.
    let resp = client
        .post(format!("{base_url}/v1/containers"))
        .json(&serde_json::json!({
            "image": "ubuntu:latest",
            "flavor": flavor_id,
            "user": "alice",
            "name": "web-1",
            "ports": [80]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let container: serde_json::Value = resp.json().await.unwrap();
    let id = container["id"].as_str().unwrap().to_string();
    assert_eq!(container["cid"], "abc123def456");
    assert_eq!(container["create_status"], true);

    // Listed.
    let resp = client
        .get(format!("{base_url}/v1/containers"))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(listing["items"].as_array().unwrap().len(), 1);

    // Stop mirrors the worker's status string.
    let resp = client
        .post(format!("{base_url}/v1/containers/{id}/stop"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let stopped: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(stopped["status"], "stopped");

    // Top returns the process table verbatim.
    let resp = client
        .post(format!("{base_url}/v1/containers/{id}/top"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let top: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(top["Titles"][0], "PID");

    // Console URL.
    let resp = client
        .post(format!("{base_url}/v1/containers/{id}/console"))
        .json(&serde_json::json!({"command": "bash", "username": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let console: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(console["url"], "https://console.example/s/abc123");

    // Delete, then delete again: the second is a clean 404.
    let resp = client
        .delete(format!("{base_url}/v1/containers/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .delete(format!("{base_url}/v1/containers/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn failed_create_returns_400_and_orphans_row() {
    let (broker, base_url, client) = rig().await;
    let (_host_id, flavor_id) = setup_host_and_flavor(&client, &base_url).await;

    let resp = client
        .post(format!("{base_url}/v1/containers"))
        .json(&serde_json::json!({
            "image": "registry/full:latest",
            "flavor": flavor_id,
            "user": "alice"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "no space");

    // The orphaned row is visible but not addressable.
    let resp = client
        .get(format!("{base_url}/v1/containers"))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = resp.json().await.unwrap();
    let orphan = &listing["items"][0];
    assert_eq!(orphan["create_status"], false);
    let orphan_id = orphan["id"].as_str().unwrap();

    let before = broker.publish_count();
    let resp = client
        .post(format!("{base_url}/v1/containers/{orphan_id}/start"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(broker.publish_count(), before);
}

#[tokio::test]
async fn create_with_no_hosts_is_a_scheduling_conflict() {
    let (broker, base_url, client) = rig().await;

    // Flavor exists, but the fleet is empty.
    let resp = client
        .get(format!("{base_url}/v1/flavors"))
        .send()
        .await
        .unwrap();
    let flavors: serde_json::Value = resp.json().await.unwrap();
    let flavor_id = flavors["items"][0]["id"].as_str().unwrap();

    let resp = client
        .post(format!("{base_url}/v1/containers"))
        .json(&serde_json::json!({
            "image": "ubuntu:latest",
            "flavor": flavor_id,
            "user": "alice"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    assert_eq!(broker.publish_count(), 0);
}

#[tokio::test]
async fn validation_errors_are_400_with_detail() {
    let (_broker, base_url, client) = rig().await;
    let (_host_id, flavor_id) = setup_host_and_flavor(&client, &base_url).await;

    let resp = client
        .post(format!("{base_url}/v1/containers"))
        .json(&serde_json::json!({
            "image": "ubuntu:latest",
            "flavor": flavor_id,
            "user": "alice"
        }))
        .send()
        .await
        .unwrap();
    let container: serde_json::Value = resp.json().await.unwrap();
    let id = container["id"].as_str().unwrap();

    // Blank exec command is rejected before dispatch.
    let resp = client
        .post(format!("{base_url}/v1/containers/{id}/exec"))
        .json(&serde_json::json!({"command": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("command"));

    // Empty dirs sequence likewise.
    let resp = client
        .post(format!("{base_url}/v1/containers/{id}/dirs/create"))
        .json(&serde_json::json!({"dirs": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Malformed identifiers are a 400, not a 500.
    let resp = client
        .post(format!("{base_url}/v1/containers/not-an-id/start"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (_broker, base_url, client) = rig().await;

    let resp = client
        .get(format!("{base_url}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "control-plane");

    let resp = client
        .get(format!("{base_url}/livez"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
