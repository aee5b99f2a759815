//! Secondary lookup cache for console URLs.
//!
//! A console allocation is expensive (a full broker round trip), and the
//! worker hands back the same URL for the same principal, container, and
//! command. Keys are a deterministic digest so any cache backend sees
//! identical keys for identical requests.

use std::collections::HashMap;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// How many leading characters of the remote identifier participate in the
/// cache key. Matches the short form workers print.
const CID_PREFIX_LEN: usize = 12;

/// Deterministic cache key for a console allocation.
pub fn console_key(username: &str, cid: &str, command: &str) -> String {
    let prefix = cid.get(..CID_PREFIX_LEN).unwrap_or(cid);
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b"|");
    hasher.update(prefix.as_bytes());
    hasher.update(b"|");
    hasher.update(command.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Narrow get/put interface over whatever cache backend a deployment wires
/// in.
pub trait ConsoleCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
}

/// Process-local cache backend.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }
}
