//! SQLite storage bootstrap, schema migrations and run transactions.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the registry and stock databases.
//! - Apply schema migrations in deterministic order.
//! - Finish a run transaction as either a commit (`--write`) or a dry run.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Program code must not read/write data before migrations succeed.
//! - Nothing a run writes is persisted unless `finish_run` is asked to commit.

use log::info;
use rusqlite::Transaction;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-layer error for connection bootstrap and raw SQL failures.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Which schema a connection carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// Genetic lines, crosses, images and publishing names.
    Registry,
    /// Fly stocks, rack locations, robot IDs, DOIs and order history.
    Stock,
}

impl DatabaseKind {
    /// Configuration key used to look the database up.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Registry => "sage",
            Self::Stock => "flyboy",
        }
    }
}

impl Display for DatabaseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::Stock => write!(f, "stock"),
        }
    }
}

/// Commits the run transaction when `write` is set, otherwise rolls it back.
///
/// Returns whether changes were committed.
pub fn finish_run(tx: Transaction<'_>, write: bool) -> DbResult<bool> {
    if write {
        tx.commit()?;
        info!("event=run_finish module=db status=ok mode=commit");
        return Ok(true);
    }

    tx.rollback()?;
    info!("event=run_finish module=db status=ok mode=dry_run");
    Ok(false)
}
