//! Store error types

use thiserror::Error;

use crate::sandbox::SimulationStatus;

/// Errors that can occur in the client store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A record with this id already exists in the collection
    #[error("Duplicate {collection} id: {id}")]
    DuplicateId { collection: &'static str, id: String },

    /// No record with this id in the collection
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Simulation status may only move forward
    #[error("Invalid simulation transition: {from} -> {to}")]
    InvalidTransition {
        from: SimulationStatus,
        to: SimulationStatus,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
