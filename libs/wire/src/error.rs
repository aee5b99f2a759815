//! Envelope construction errors.

use thiserror::Error;

/// A command envelope could not be constructed from the given fields.
///
/// These are caller-input faults: the envelope is never dispatched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// A required string field is missing or blank.
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// A required sequence field has no elements.
    #[error("field '{0}' must be a non-empty sequence")]
    EmptySequence(&'static str),
}
