//! The errors the engine can return.
//!
//! Every variant except [`Database`] is an expected, recoverable outcome that
//! is surfaced to the caller verbatim together with a stable code. Storage
//! failures are wrapped in [`Database`] and masked at the HTTP boundary.
//!
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("business rule violated: {0}")]
    BusinessRule(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable machine-readable code for API responses.
    ///
    /// Callers key retry behaviour off these: `CONFLICT` is retryable after a
    /// refetch, the others are not.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Permission(_) => "PERMISSION_DENIED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::BusinessRule(_) => "BUSINESS_RULE",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Permission(a), Self::Permission(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::BusinessRule(a), Self::BusinessRule(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
