//! Program services: one per sync or repair job.
//!
//! # Responsibility
//! - Implement each job's rules on top of repository and REST contracts.
//! - Count row-level outcomes in a per-job report.
//!
//! # Invariants
//! - Infrastructure failures propagate as [`SyncError`]; row-level problems are
//!   logged, counted and skipped.
//! - Services never commit; the caller finishes the run transaction.

use crate::db::DbError;
use crate::repo::RepoError;
use crate::rest::RestError;
use thiserror::Error;

pub mod cross_line_service;
pub mod doi_service;
pub mod initial_split_service;
pub mod input;
pub mod line_cleanup_service;
pub mod order_report_service;
pub mod progress;
pub mod publishing_name_service;
pub mod rack_service;
pub mod robot_id_service;

pub use input::InputError;
pub use progress::{NoProgress, RunProgress};

pub type SyncResult<T> = Result<T, SyncError>;

/// Fatal error that ends a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Repo(#[from] RepoError),
    #[error("{0}")]
    Rest(#[from] RestError),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("{0}")]
    Input(#[from] InputError),
    #[error("{0}")]
    Usage(String),
    #[error("report write failed: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),
}

impl From<rusqlite::Error> for SyncError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Writes one right-aligned counter line of a run summary.
pub(crate) fn write_counter(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    value: u64,
) -> std::fmt::Result {
    writeln!(f, "{:<28}{:>8}", format!("{label}:"), value)
}
