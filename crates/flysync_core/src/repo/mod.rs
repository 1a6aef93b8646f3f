//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for both databases.
//! - Isolate SQL details from the program services.
//!
//! # Invariants
//! - Repository methods never commit; the caller owns the run transaction.
//! - Write methods report affected row counts so callers can log and count them.

use crate::db::DbError;
use thiserror::Error;

pub mod registry_repo;
pub mod stock_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
