//! Broker routing derived from the message type.
//!
//! The naming convention is fixed: for a message type `create_container` the
//! command is published to exchange `container`, queue
//! `create-container-queue`, routing key `create.container.router`. Workers
//! rely on this convention to bind their consumers, so it must not change
//! per deployment.

use serde::{Deserialize, Serialize};

/// Exchange all container commands are published to.
pub const COMMAND_EXCHANGE: &str = "container";

/// Operation discriminator carried in every command envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    CreateContainer,
    StartContainer,
    StopContainer,
    RestartContainer,
    PauseContainer,
    UnpauseContainer,
    DeleteContainer,
    TopContainer,
    InspectContainer,
    ExecContainer,
    ConsoleContainer,
    FilesWriteContainer,
    FilesReadContainer,
    FilesListContainer,
    FilesDeleteContainer,
    DirsCreateContainer,
    DirsDeleteContainer,
    HostExecContainer,
}

impl MessageType {
    /// Every message type, in a stable order.
    pub const ALL: [MessageType; 18] = [
        MessageType::CreateContainer,
        MessageType::StartContainer,
        MessageType::StopContainer,
        MessageType::RestartContainer,
        MessageType::PauseContainer,
        MessageType::UnpauseContainer,
        MessageType::DeleteContainer,
        MessageType::TopContainer,
        MessageType::InspectContainer,
        MessageType::ExecContainer,
        MessageType::ConsoleContainer,
        MessageType::FilesWriteContainer,
        MessageType::FilesReadContainer,
        MessageType::FilesListContainer,
        MessageType::FilesDeleteContainer,
        MessageType::DirsCreateContainer,
        MessageType::DirsDeleteContainer,
        MessageType::HostExecContainer,
    ];

    /// The wire-level discriminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::CreateContainer => "create_container",
            MessageType::StartContainer => "start_container",
            MessageType::StopContainer => "stop_container",
            MessageType::RestartContainer => "restart_container",
            MessageType::PauseContainer => "pause_container",
            MessageType::UnpauseContainer => "unpause_container",
            MessageType::DeleteContainer => "delete_container",
            MessageType::TopContainer => "top_container",
            MessageType::InspectContainer => "inspect_container",
            MessageType::ExecContainer => "exec_container",
            MessageType::ConsoleContainer => "console_container",
            MessageType::FilesWriteContainer => "files_write_container",
            MessageType::FilesReadContainer => "files_read_container",
            MessageType::FilesListContainer => "files_list_container",
            MessageType::FilesDeleteContainer => "files_delete_container",
            MessageType::DirsCreateContainer => "dirs_create_container",
            MessageType::DirsDeleteContainer => "dirs_delete_container",
            MessageType::HostExecContainer => "host_exec_container",
        }
    }

    /// Derives the broker route for this message type.
    pub fn route(&self) -> Route {
        let name = self.as_str();
        Route {
            exchange: COMMAND_EXCHANGE,
            queue: format!("{}-queue", name.replace('_', "-")),
            routing_key: format!("{}.router", name.replace('_', ".")),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete broker destination for one message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub exchange: &'static str,
    pub queue: String,
    pub routing_key: String,
}
