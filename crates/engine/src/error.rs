//! The module contains the errors the engine can throw.
//!
//! Business-rule errors are returned synchronously and are never retried:
//!
//! - [`InvalidRequest`] malformed input (bad ids, empty targets, period out of range).
//! - [`SourceAlreadyUsed`] the source account was consumed by a completed run.
//! - [`NotFound`] a referenced entity is missing.
//! - [`AlreadyMatched`] / [`InvalidTarget`] manual reconciliation conflicts.
//!
//! [`PersistenceFailure`] and [`Database`] are the only retryable class: the
//! operation that produced them did not commit.
//!
//!  [`InvalidRequest`]: EngineError::InvalidRequest
//!  [`SourceAlreadyUsed`]: EngineError::SourceAlreadyUsed
//!  [`NotFound`]: EngineError::NotFound
//!  [`AlreadyMatched`]: EngineError::AlreadyMatched
//!  [`InvalidTarget`]: EngineError::InvalidTarget
//!  [`PersistenceFailure`]: EngineError::PersistenceFailure
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Source account \"{0}\" was already used by a reconciliation run")]
    SourceAlreadyUsed(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Transaction \"{0}\" is already matched")]
    AlreadyMatched(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when retrying the whole operation is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_) | Self::Database(_))
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::SourceAlreadyUsed(_) => "source_already_used",
            Self::NotFound(_) => "not_found",
            Self::AlreadyMatched(_) => "already_matched",
            Self::InvalidTarget(_) => "invalid_target",
            Self::ExistingKey(_) => "existing_key",
            Self::PersistenceFailure(_) | Self::Database(_) => "persistence_failure",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRequest(a), Self::InvalidRequest(b)) => a == b,
            (Self::SourceAlreadyUsed(a), Self::SourceAlreadyUsed(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AlreadyMatched(a), Self::AlreadyMatched(b)) => a == b,
            (Self::InvalidTarget(a), Self::InvalidTarget(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::PersistenceFailure(a), Self::PersistenceFailure(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
