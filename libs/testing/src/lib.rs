//! # pylon-testing
//!
//! Test doubles for the dispatch plumbing: an in-memory broker implementing
//! the [`pylon_wire::Transport`] contract, a scripted stub worker that
//! answers commands without a container engine, and reply builders for the
//! payload shapes real workers produce.
//!
//! Nothing in this crate touches the network, so bridge and orchestrator
//! behavior can be exercised deterministically in unit and integration tests.

mod broker;
pub mod replies;
mod worker;

pub use broker::{MemoryBroker, MemoryConnector, MemoryTransport, PublishedCommand};
pub use worker::StubWorker;
