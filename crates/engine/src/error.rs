//! The module contains the error the engine can throw.
//!
//! Every variant belongs to one [`ErrorKind`], which is what callers branch
//! on when rendering a message or choosing a status:
//!
//! - [`KeyNotFound`] is `NotFound`: a referenced entity is absent.
//! - [`Forbidden`] is `Forbidden`: the entity exists but belongs to another
//!   user or budget.
//! - [`ExistingKey`] and [`Conflict`] are `Conflict`.
//! - [`InsufficientFunds`] is raised by money moves.
//! - [`Database`] is the only `Internal` error.
//!
//! Everything else is a validation failure.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Conflict`]: EngineError::Conflict
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Conflict,
    InsufficientFunds,
    Internal,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Locked: {0}")]
    Locked(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns the taxonomy class of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::ExistingKey(_) | Self::Conflict(_) => ErrorKind::Conflict,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::Database(_) => ErrorKind::Internal,
            Self::InvalidAmount(_)
            | Self::InvalidName(_)
            | Self::InvalidMonth(_)
            | Self::InvalidCategory(_)
            | Self::InvalidTransfer(_)
            | Self::InvalidSplit(_)
            | Self::InvalidGoal(_)
            | Self::InvalidAccount(_)
            | Self::InvalidId(_)
            | Self::InvalidCursor(_)
            | Self::Locked(_) => ErrorKind::Validation,
        }
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b))
            | (Self::Forbidden(a), Self::Forbidden(b))
            | (Self::ExistingKey(a), Self::ExistingKey(b))
            | (Self::Conflict(a), Self::Conflict(b))
            | (Self::InsufficientFunds(a), Self::InsufficientFunds(b))
            | (Self::InvalidAmount(a), Self::InvalidAmount(b))
            | (Self::InvalidName(a), Self::InvalidName(b))
            | (Self::InvalidMonth(a), Self::InvalidMonth(b))
            | (Self::InvalidCategory(a), Self::InvalidCategory(b))
            | (Self::InvalidTransfer(a), Self::InvalidTransfer(b))
            | (Self::InvalidSplit(a), Self::InvalidSplit(b))
            | (Self::InvalidGoal(a), Self::InvalidGoal(b))
            | (Self::InvalidAccount(a), Self::InvalidAccount(b))
            | (Self::InvalidId(a), Self::InvalidId(b))
            | (Self::InvalidCursor(a), Self::InvalidCursor(b))
            | (Self::Locked(a), Self::Locked(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
