//! Domain errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Overlap detected at commit time (shift/extend lost the race,
    /// or the requested window is already taken).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation on a session/reservation in the wrong lifecycle state,
    /// e.g. a charge update with no reservation window covering now.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A notification stream write failed. Terminates only that stream.
    #[error("Transport: {0}")]
    Transport(String),

    #[error("Validation: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
