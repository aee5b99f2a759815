use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub log_level: String,
    /// Upper bound on one dispatch round trip. A worker that never replies
    /// must fail the call, not wedge the request thread forever.
    pub call_timeout: Duration,
    pub serialize_container_ops: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("PYLON_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let mqtt_host =
            std::env::var("PYLON_MQTT_HOST").unwrap_or_else(|_| "localhost".to_string());

        let mqtt_port = std::env::var("PYLON_MQTT_PORT")
            .unwrap_or_else(|_| "1883".to_string())
            .parse()?;

        let log_level = std::env::var("PYLON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let call_timeout_secs: u64 = std::env::var("PYLON_CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        let serialize_container_ops = std::env::var("PYLON_SERIALIZE_CONTAINER_OPS")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            mqtt_host,
            mqtt_port,
            log_level,
            call_timeout: Duration::from_secs(call_timeout_secs),
            serialize_container_ops,
        })
    }
}
