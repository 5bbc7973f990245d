//! The module contains the errors the engine can throw.
//!
//! Three kinds are expected, typed failures the API layer maps to a
//! response:
//!
//! - [`Duplicate`] when a storage uniqueness constraint is violated.
//! - [`NotFound`] when a required row does not exist (also used for a
//!   disallowed sort field in listings).
//! - [`Unauthorized`] when no authenticated user can be resolved.
//!
//! Everything else propagates as-is through [`Database`].
//!
//! [`Duplicate`]: EngineError::Duplicate
//! [`NotFound`]: EngineError::NotFound
//! [`Unauthorized`]: EngineError::Unauthorized
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
    #[error("no authenticated user")]
    Unauthorized,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Duplicate(a), Self::Duplicate(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Unauthorized, Self::Unauthorized) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
