//! Command envelopes.
//!
//! One variant per worker operation, discriminated by `message_type` on the
//! wire. Required fields are checked by the constructors, so an envelope that
//! exists is dispatchable; callers never need to re-check key presence after
//! construction.

use std::collections::BTreeMap;

use pylon_id::{ContainerId, FlavorId};
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::route::MessageType;

/// Addressing data for an operation on an existing container: the
/// control-plane row identifier plus the worker-assigned remote identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: ContainerId,
    pub cid: String,
}

/// Everything a worker needs to create a container.
#[derive(Debug, Clone)]
pub struct CreateSpec {
    pub id: ContainerId,
    pub name: Option<String>,
    pub image: String,
    pub flavor: FlavorId,
    pub user: String,
    pub command: Option<String>,
    pub hostname: Option<String>,
    pub ports: Vec<u16>,
    pub host_ip: String,
    pub host_port: u16,
}

/// The command envelope published to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Command {
    CreateContainer {
        id: ContainerId,
        name: Option<String>,
        image: String,
        flavor: FlavorId,
        user: String,
        command: Option<String>,
        hostname: Option<String>,
        ports: Vec<u16>,
        host_ip: String,
        host_port: u16,
    },
    StartContainer {
        id: ContainerId,
        cid: String,
    },
    StopContainer {
        id: ContainerId,
        cid: String,
    },
    RestartContainer {
        id: ContainerId,
        cid: String,
    },
    PauseContainer {
        id: ContainerId,
        cid: String,
    },
    UnpauseContainer {
        id: ContainerId,
        cid: String,
    },
    DeleteContainer {
        id: ContainerId,
        cid: String,
    },
    TopContainer {
        id: ContainerId,
        cid: String,
    },
    InspectContainer {
        id: ContainerId,
        cid: String,
    },
    ExecContainer {
        id: ContainerId,
        cid: String,
        command: String,
    },
    ConsoleContainer {
        id: ContainerId,
        cid: String,
        command: String,
        username: String,
    },
    FilesWriteContainer {
        id: ContainerId,
        cid: String,
        files: BTreeMap<String, String>,
        username: String,
    },
    FilesReadContainer {
        id: ContainerId,
        cid: String,
        files: Vec<String>,
        username: String,
    },
    FilesListContainer {
        id: ContainerId,
        cid: String,
        dirs: Vec<String>,
        files: Vec<String>,
    },
    FilesDeleteContainer {
        id: ContainerId,
        cid: String,
        dirs: Vec<String>,
        files: Vec<String>,
    },
    DirsCreateContainer {
        id: ContainerId,
        cid: String,
        dirs: Vec<String>,
    },
    DirsDeleteContainer {
        id: ContainerId,
        cid: String,
        dirs: Vec<String>,
    },
    HostExecContainer {
        id: ContainerId,
        cid: String,
        commands: Vec<String>,
        username: String,
        wait: bool,
    },
}

fn required(field: &'static str, value: &str) -> Result<(), EnvelopeError> {
    if value.trim().is_empty() {
        return Err(EnvelopeError::EmptyField(field));
    }
    Ok(())
}

impl Command {
    pub fn create(spec: CreateSpec) -> Result<Self, EnvelopeError> {
        required("image", &spec.image)?;
        required("user", &spec.user)?;
        required("host_ip", &spec.host_ip)?;
        Ok(Command::CreateContainer {
            id: spec.id,
            name: spec.name,
            image: spec.image,
            flavor: spec.flavor,
            user: spec.user,
            command: spec.command,
            hostname: spec.hostname,
            ports: spec.ports,
            host_ip: spec.host_ip,
            host_port: spec.host_port,
        })
    }

    pub fn start(target: &Target) -> Self {
        Command::StartContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn stop(target: &Target) -> Self {
        Command::StopContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn restart(target: &Target) -> Self {
        Command::RestartContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn pause(target: &Target) -> Self {
        Command::PauseContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn unpause(target: &Target) -> Self {
        Command::UnpauseContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn delete(target: &Target) -> Self {
        Command::DeleteContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn top(target: &Target) -> Self {
        Command::TopContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn inspect(target: &Target) -> Self {
        Command::InspectContainer {
            id: target.id,
            cid: target.cid.clone(),
        }
    }

    pub fn exec(target: &Target, command: String) -> Result<Self, EnvelopeError> {
        required("command", &command)?;
        Ok(Command::ExecContainer {
            id: target.id,
            cid: target.cid.clone(),
            command,
        })
    }

    pub fn console(
        target: &Target,
        command: String,
        username: String,
    ) -> Result<Self, EnvelopeError> {
        required("command", &command)?;
        required("username", &username)?;
        Ok(Command::ConsoleContainer {
            id: target.id,
            cid: target.cid.clone(),
            command,
            username,
        })
    }

    pub fn files_write(
        target: &Target,
        files: BTreeMap<String, String>,
        username: String,
    ) -> Result<Self, EnvelopeError> {
        if files.is_empty() {
            return Err(EnvelopeError::EmptySequence("files"));
        }
        required("username", &username)?;
        Ok(Command::FilesWriteContainer {
            id: target.id,
            cid: target.cid.clone(),
            files,
            username,
        })
    }

    pub fn files_read(
        target: &Target,
        files: Vec<String>,
        username: String,
    ) -> Result<Self, EnvelopeError> {
        if files.is_empty() {
            return Err(EnvelopeError::EmptySequence("files"));
        }
        required("username", &username)?;
        Ok(Command::FilesReadContainer {
            id: target.id,
            cid: target.cid.clone(),
            files,
            username,
        })
    }

    pub fn files_list(
        target: &Target,
        dirs: Vec<String>,
        files: Vec<String>,
    ) -> Result<Self, EnvelopeError> {
        if dirs.is_empty() && files.is_empty() {
            return Err(EnvelopeError::EmptySequence("dirs or files"));
        }
        Ok(Command::FilesListContainer {
            id: target.id,
            cid: target.cid.clone(),
            dirs,
            files,
        })
    }

    pub fn files_delete(
        target: &Target,
        dirs: Vec<String>,
        files: Vec<String>,
    ) -> Result<Self, EnvelopeError> {
        if dirs.is_empty() && files.is_empty() {
            return Err(EnvelopeError::EmptySequence("dirs or files"));
        }
        Ok(Command::FilesDeleteContainer {
            id: target.id,
            cid: target.cid.clone(),
            dirs,
            files,
        })
    }

    pub fn dirs_create(target: &Target, dirs: Vec<String>) -> Result<Self, EnvelopeError> {
        if dirs.is_empty() {
            return Err(EnvelopeError::EmptySequence("dirs"));
        }
        Ok(Command::DirsCreateContainer {
            id: target.id,
            cid: target.cid.clone(),
            dirs,
        })
    }

    pub fn dirs_delete(target: &Target, dirs: Vec<String>) -> Result<Self, EnvelopeError> {
        if dirs.is_empty() {
            return Err(EnvelopeError::EmptySequence("dirs"));
        }
        Ok(Command::DirsDeleteContainer {
            id: target.id,
            cid: target.cid.clone(),
            dirs,
        })
    }

    pub fn host_exec(
        target: &Target,
        commands: Vec<String>,
        username: String,
        wait: bool,
    ) -> Result<Self, EnvelopeError> {
        if commands.is_empty() {
            return Err(EnvelopeError::EmptySequence("commands"));
        }
        required("username", &username)?;
        Ok(Command::HostExecContainer {
            id: target.id,
            cid: target.cid.clone(),
            commands,
            username,
            wait,
        })
    }

    /// The discriminator of this envelope, used for routing.
    pub fn message_type(&self) -> MessageType {
        match self {
            Command::CreateContainer { .. } => MessageType::CreateContainer,
            Command::StartContainer { .. } => MessageType::StartContainer,
            Command::StopContainer { .. } => MessageType::StopContainer,
            Command::RestartContainer { .. } => MessageType::RestartContainer,
            Command::PauseContainer { .. } => MessageType::PauseContainer,
            Command::UnpauseContainer { .. } => MessageType::UnpauseContainer,
            Command::DeleteContainer { .. } => MessageType::DeleteContainer,
            Command::TopContainer { .. } => MessageType::TopContainer,
            Command::InspectContainer { .. } => MessageType::InspectContainer,
            Command::ExecContainer { .. } => MessageType::ExecContainer,
            Command::ConsoleContainer { .. } => MessageType::ConsoleContainer,
            Command::FilesWriteContainer { .. } => MessageType::FilesWriteContainer,
            Command::FilesReadContainer { .. } => MessageType::FilesReadContainer,
            Command::FilesListContainer { .. } => MessageType::FilesListContainer,
            Command::FilesDeleteContainer { .. } => MessageType::FilesDeleteContainer,
            Command::DirsCreateContainer { .. } => MessageType::DirsCreateContainer,
            Command::DirsDeleteContainer { .. } => MessageType::DirsDeleteContainer,
            Command::HostExecContainer { .. } => MessageType::HostExecContainer,
        }
    }
}
