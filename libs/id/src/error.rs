//! Error types for identifier parsing.

use thiserror::Error;

/// Errors that can occur when parsing an identifier string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// The identifier is missing the underscore separator.
    #[error("identifier missing underscore separator")]
    MissingSeparator,

    /// The identifier carries a prefix of a different resource kind.
    #[error("invalid identifier prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ULID portion of the identifier is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}
