//! Command execution, consoles, and filesystem operations.

use std::collections::BTreeMap;

use pylon_id::ContainerId;
use pylon_wire::{Command, Target};
use serde_json::Value;
use tracing::debug;

use crate::bridge::BridgeError;
use crate::cache::console_key;
use crate::orchestrator::{Error, Orchestrator};

impl Orchestrator {
    pub async fn top(&self, id: ContainerId) -> Result<Value, Error> {
        self.query(id, Command::top).await
    }

    pub async fn inspect(&self, id: ContainerId) -> Result<Value, Error> {
        self.query(id, Command::inspect).await
    }

    pub async fn exec(&self, id: ContainerId, command: String) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::exec(&target, command)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    /// Allocates (or re-uses) a console for the given principal and command.
    /// The worker hands back a URL which is cached under a deterministic key,
    /// so repeated requests skip the broker round trip.
    pub async fn console(
        &self,
        id: ContainerId,
        command: String,
        username: String,
    ) -> Result<String, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::console(&target, command.clone(), username.clone())?;

        let key = console_key(&username, &target.cid, &command);
        if let Some(url) = self.console_cache().get(&key) {
            debug!(container_id = %id, "console URL served from cache");
            return Ok(url);
        }

        let reply = self.dispatch(&envelope).await?;
        let url = reply
            .result
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::Bridge(BridgeError::Protocol(
                    "console reply missing 'url'".to_string(),
                ))
            })?
            .to_string();
        self.console_cache().put(&key, url.clone());
        Ok(url)
    }

    pub async fn files_write(
        &self,
        id: ContainerId,
        files: BTreeMap<String, String>,
        username: String,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::files_write(&target, files, username)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn files_read(
        &self,
        id: ContainerId,
        files: Vec<String>,
        username: String,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::files_read(&target, files, username)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn files_list(
        &self,
        id: ContainerId,
        dirs: Vec<String>,
        files: Vec<String>,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::files_list(&target, dirs, files)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn files_delete(
        &self,
        id: ContainerId,
        dirs: Vec<String>,
        files: Vec<String>,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::files_delete(&target, dirs, files)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn dirs_create(&self, id: ContainerId, dirs: Vec<String>) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::dirs_create(&target, dirs)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn dirs_delete(&self, id: ContainerId, dirs: Vec<String>) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::dirs_delete(&target, dirs)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    pub async fn host_exec(
        &self,
        id: ContainerId,
        commands: Vec<String>,
        username: String,
        wait: bool,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let envelope = Command::host_exec(&target, commands, username, wait)?;
        let reply = self.dispatch(&envelope).await?;
        Ok(reply.result)
    }

    async fn query(
        &self,
        id: ContainerId,
        build: fn(&Target) -> Command,
    ) -> Result<Value, Error> {
        let _guard = self.op_guard(id).await;
        let (_, target) = self.load_addressable(id).await?;
        let reply = self.dispatch(&build(&target)).await?;
        Ok(reply.result)
    }
}
