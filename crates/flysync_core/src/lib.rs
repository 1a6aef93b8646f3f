//! Core logic for the fly line registry and stock database sync jobs.
//! Each job is a service over repository and REST contracts; binaries only wire them up.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rest;
pub mod service;

pub use config::{Access, ConfigError, FlysyncConfig, Manifold, SettingsResolver};
pub use db::{finish_run, open_db, open_db_in_memory, DatabaseKind, DbError, DbResult};
pub use logging::{init_logging, level_for_flags, logging_status};
pub use repo::registry_repo::SqliteRegistryRepository;
pub use repo::stock_repo::SqliteStockRepository;
pub use repo::{RepoError, RepoResult};
pub use rest::{RestClient, RestError, RestResult};
pub use service::{NoProgress, RunProgress, SyncError, SyncResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
