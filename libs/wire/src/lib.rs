//! # pylon-wire
//!
//! The wire contract between the control plane and container workers.
//!
//! Commands are a tagged union serialized with a mandatory `message_type`
//! discriminator; replies are a fixed 3-element envelope
//! `[status, message, result]` where `status == 0` is the only success
//! sentinel. Routing (exchange, queue, routing key) is derived
//! deterministically from the message type so both sides agree on broker
//! topology without negotiation.
//!
//! The crate also defines the transport seam ([`Transport`], [`Connector`])
//! the dispatch bridge publishes and consumes through, so broker backends and
//! test doubles share one contract.

mod command;
mod error;
mod reply;
mod route;
mod transport;

pub use command::{Command, CreateSpec, Target};
pub use error::EnvelopeError;
pub use reply::Reply;
pub use route::{MessageType, Route, COMMAND_EXCHANGE};
pub use transport::{CallProperties, Connector, Delivery, Transport, TransportError};
