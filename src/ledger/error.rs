//! Ledger Error Types
//!
//! One taxonomy shared by the store, the transaction coordinator and the
//! transfer engine.
//!
//! ## SQLx mapping
//!
//! | SQLx Error | SQLSTATE | LedgerError |
//! |------------|----------|-------------|
//! | Database (unique violation) | `23505` | `ConstraintViolation` |
//! | Database (foreign key violation) | `23503` | `ConstraintViolation` |
//! | Database (check violation) | `23514` | `ConstraintViolation` |
//! | Database (serialization failure) | `40001` | `SerializationConflict` |
//! | Database (deadlock detected) | `40P01` | `SerializationConflict` |
//! | Database (other) | any other | `Internal` |
//! | RowNotFound | N/A | `NotFound` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Unavailable` |
//! | Other | N/A | `Internal` |

use std::time::Duration;

use thiserror::Error;

use crate::core_types::AccountId;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness, foreign-key or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Lock-wait or serialization conflict. Retrying is the caller's decision.
    #[error("Serialization conflict: {0}")]
    SerializationConflict(String),

    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),

    /// The unit of work failed and was rolled back.
    ///
    /// `rollback` is set only when the rollback itself failed; both causes
    /// are kept.
    #[error("Transaction failed: {cause}{}", rollback_suffix(.rollback))]
    TransactionFailure {
        #[source]
        cause: Box<LedgerError>,
        rollback: Option<Box<LedgerError>>,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn rollback_suffix(rollback: &Option<Box<LedgerError>>) -> String {
    match rollback {
        Some(rb) => format!(" (rollback failed: {})", rb),
        None => String::new(),
    }
}

impl LedgerError {
    pub fn account_not_found(id: AccountId) -> Self {
        LedgerError::NotFound(format!("account {}", id))
    }

    /// Wrap a unit-of-work failure
    pub fn transaction(cause: LedgerError, rollback: Option<LedgerError>) -> Self {
        LedgerError::TransactionFailure {
            cause: Box::new(cause),
            rollback: rollback.map(Box::new),
        }
    }

    /// The innermost error, looking through transaction wrappers.
    ///
    /// Transport code branches on this so that a `NotFound` raised inside a
    /// transaction surfaces as `NotFound`.
    pub fn root_cause(&self) -> &LedgerError {
        match self {
            LedgerError::TransactionFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), LedgerError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.root_cause(), LedgerError::ConstraintViolation(_))
    }

    /// True for conflicts a caller may reasonably retry
    pub fn is_retryable(&self) -> bool {
        matches!(self.root_cause(), LedgerError::SerializationConflict(_))
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self.root_cause() {
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            LedgerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LedgerError::SerializationConflict(_) => "SERIALIZATION_CONFLICT",
            LedgerError::Timeout(_) => "TIMEOUT",
            LedgerError::TransactionFailure { .. } => "TRANSACTION_FAILURE",
            LedgerError::Unavailable(_) => "UNAVAILABLE",
            LedgerError::Internal(_) => "INTERNAL",
        }
    }
}

/// Map a SQLx error raised by `operation` onto the ledger taxonomy.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") | Some("23514") => {
                    LedgerError::ConstraintViolation(msg)
                }
                Some("40001") | Some("40P01") => LedgerError::SerializationConflict(msg),
                _ => LedgerError::Internal(msg),
            }
        }
        sqlx::Error::RowNotFound => LedgerError::NotFound(format!("{}: no rows", operation)),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => LedgerError::Unavailable(format!("{}: {}", operation, err)),
        _ => LedgerError::Internal(format!("{}: {}", operation, err)),
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error("query", e)
    }
}
