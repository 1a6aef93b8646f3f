//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations per database kind in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic within one kind.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DatabaseKind, DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const REGISTRY_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_registry_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_registry_unique_names.sql"),
    },
];

const STOCK_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_stock_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_stock_order_history.sql"),
    },
];

fn migrations_for(kind: DatabaseKind) -> &'static [Migration] {
    match kind {
        DatabaseKind::Registry => REGISTRY_MIGRATIONS,
        DatabaseKind::Stock => STOCK_MIGRATIONS,
    }
}

/// Returns the latest migration version known by this binary for `kind`.
pub fn latest_version(kind: DatabaseKind) -> u32 {
    migrations_for(kind)
        .last()
        .map_or(0, |migration| migration.version)
}

/// Applies all pending migrations for `kind` on the provided connection.
pub fn apply_migrations(conn: &mut Connection, kind: DatabaseKind) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version(kind);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations_for(kind) {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
