//! # pylon-id
//!
//! Typed resource identifiers for the pylon control plane.
//!
//! Every identifier uses a prefixed format: `{prefix}_{ulid}`, e.g.
//! `ctr_01HV4Z2WQXKJNM8GPQY6VBKC3D`. The prefix prevents mixing identifiers
//! of different resource kinds; the ULID part keeps them sortable by creation
//! time and globally unique.
//!
//! The remote container identifier handed out by a worker (the engine-assigned
//! `cid`) is *not* one of these: it is an opaque string owned by the worker
//! and stored verbatim.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations.
pub use ulid::Ulid;
