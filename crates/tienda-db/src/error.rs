//! # Store Errors
//!
//! ```text
//! sqlx::Error ─────┐
//!                  ├──► DbError ──► ApiError (status + {code, message})
//! CoreError ───────┘
//!   (business outcome, wrapped as DbError::Domain)
//! ```
//!
//! An error escaping a unit of work drops its transaction, so whatever the
//! variant, nothing of the failed operation is left behind.

use thiserror::Error;
use tienda_core::{CoreError, ValidationError};

// SQLite result codes meaning another writer got there first.
// 517 is SQLITE_BUSY_SNAPSHOT: a WAL read snapshot went stale before the write.
const WRITE_CONTENTION_CODES: [&str; 3] = ["5", "6", "517"];

/// Failure of a storage operation or of a service running on top of one.
///
/// `Domain` and `Conflict` are outcomes a caller is expected to handle. All
/// other variants are storage faults.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A version token or status guard moved underneath us, or SQLite stayed
    /// locked past the busy timeout. Retrying the whole operation is safe.
    #[error("Concurrent update conflict on {entity} {id}")]
    Conflict { entity: String, id: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// UNIQUE, FOREIGN KEY or CHECK rejected a write.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT failed for a reason other than contention.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Wraps a BEGIN/COMMIT failure. Contention stays a `Conflict`.
    pub(crate) fn transaction(err: sqlx::Error) -> Self {
        match DbError::from(err) {
            conflict @ DbError::Conflict { .. } => conflict,
            other => DbError::TransactionFailed(other.to_string()),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict { .. })
    }

    /// Neither a business outcome nor a lost race.
    pub fn is_storage_failure(&self) -> bool {
        !matches!(
            self,
            DbError::Domain(_) | DbError::Conflict { .. } | DbError::NotFound { .. }
        )
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// ```text
/// BUSY / LOCKED / BUSY_SNAPSHOT  → Conflict
/// UNIQUE / FOREIGN KEY / CHECK   → Constraint
/// other database error           → QueryFailed
/// RowNotFound                    → NotFound
/// PoolTimedOut                   → PoolExhausted
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let contended = db_err
                    .code()
                    .is_some_and(|code| WRITE_CONTENTION_CODES.contains(&&*code));
                let msg = db_err.message();

                if contended || msg.contains("database is locked") {
                    DbError::conflict("database", "write lock")
                } else if msg.contains("constraint failed") {
                    DbError::Constraint(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let conflict = DbError::conflict("Product", "p-1");
        assert!(conflict.is_conflict());
        assert!(!conflict.is_storage_failure());

        let domain: DbError = CoreError::EmptyCart.into();
        assert!(!domain.is_storage_failure());

        assert!(DbError::PoolExhausted.is_storage_failure());
        assert!(DbError::QueryFailed("boom".into()).is_storage_failure());
        assert!(DbError::Constraint("CHECK constraint failed".into()).is_storage_failure());
    }

    #[test]
    fn test_domain_message_is_transparent() {
        let err: DbError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }
}
