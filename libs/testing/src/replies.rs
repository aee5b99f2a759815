//! Builders for the reply payload shapes real workers produce.

use pylon_wire::Reply;
use serde_json::json;

/// Successful create: remote identifier plus the engine's view of the
/// container.
pub fn create_ok(cid: &str) -> Reply {
    Reply::ok(json!({
        "cid": cid,
        "status": "Up Less than a second",
        "created": "2026-01-01 00:00:00",
        "size": 0,
    }))
}

/// Successful lifecycle transition mirroring a status string.
pub fn status_ok(status: &str) -> Reply {
    Reply::ok(json!({ "status": status }))
}

/// Successful `top`: the engine's process table.
pub fn top_ok() -> Reply {
    Reply::ok(json!({
        "Titles": ["PID", "USER", "COMMAND"],
        "Processes": [["1", "root", "/bin/bash"]],
    }))
}

/// Successful console allocation.
pub fn console_ok(url: &str) -> Reply {
    Reply::ok(json!({ "url": url }))
}
