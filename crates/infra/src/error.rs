//! Store-level errors.
//!
//! These are persistence failures, as opposed to domain rule violations. Domain
//! errors raised while a store holds a lock or transaction (invoice numbering)
//! are carried through `StoreError::Domain`.

use thiserror::Error;

use edugest_core::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique or referential constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Driver, pool or lock failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(kind: &str) -> Self {
        Self::NotFound(kind.to_string())
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("lock poisoned".to_string())
    }
}

/// Map SQLx errors to `StoreError`.
///
/// | PostgreSQL code | meaning | `StoreError` |
/// |---|---|---|
/// | `23505` | unique violation | `Conflict` |
/// | `23503` | foreign key violation | `Conflict` |
/// | `23514` | check violation | `Conflict` |
/// | other / non-database | | `Backend` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let detail = db_err
                .constraint()
                .map(|c| format!("constraint {c}"))
                .unwrap_or_else(|| db_err.message().to_string());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(format!("duplicate value ({detail})")),
                Some("23503") => StoreError::Conflict(format!("row is still referenced ({detail})")),
                Some("23514") => StoreError::Conflict(format!("check failed ({detail})")),
                _ => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
