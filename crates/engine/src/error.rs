//! The module contains the errors the engine can throw.
//!
//! Validation, state, and conflict errors are surfaced to the caller with no
//! state change. [`Duplicate`] and [`AlreadyProcessed`] mark idempotency
//! violations: a replayed external reference or an already-resolved
//! transaction. [`ExternalFetch`] is recovered locally by the reconciliation
//! engine and never aborts a sync.
//!
//! [`Duplicate`]: EngineError::Duplicate
//! [`AlreadyProcessed`]: EngineError::AlreadyProcessed
//! [`ExternalFetch`]: EngineError::ExternalFetch
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Operation not valid in current state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Duplicate: {0}")]
    Duplicate(String),
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("External fetch failed: {0}")]
    ExternalFetch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Duplicate(a), Self::Duplicate(b)) => a == b,
            (Self::AlreadyProcessed(a), Self::AlreadyProcessed(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExternalFetch(a), Self::ExternalFetch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
