//! Error types returned by the map.

use thiserror::Error;

/// Failure of a keyed lookup or removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("key not found in map")]
    NotFound,
}

/// Construction-time precondition violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("capacity must be at least one bucket")]
    Zero,
}
