//! Reply envelopes.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The reply envelope consumed from the broker.
///
/// On the wire this is always a 3-element array `[status, message, result]`.
/// `status == 0` is the only success sentinel; anything else is a
/// caller-visible failure whose `message` explains why. Any other JSON shape
/// is a protocol violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: i64,
    pub message: String,
    pub result: Value,
}

impl Reply {
    /// A success reply carrying a result payload.
    pub fn ok(result: Value) -> Self {
        Self {
            status: 0,
            message: String::new(),
            result,
        }
    }

    /// A failure reply with a worker-supplied status and message.
    pub fn failure(status: i64, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            result: Value::String(String::new()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

impl Serialize for Reply {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.status, &self.message, &self.result).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Reply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (status, message, result) = <(i64, String, Value)>::deserialize(deserializer)?;
        Ok(Self {
            status,
            message,
            result,
        })
    }
}
