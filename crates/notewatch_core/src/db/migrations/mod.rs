//! Ordered schema migrations for the ledger database.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - Pending migrations run inside one transaction; a failing script leaves
//!   `user_version` untouched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "review_ledger",
    sql: include_str!("0001_review_ledger.sql"),
}];

/// Latest schema version this binary can produce.
pub fn latest_version() -> u32 {
    latest_in(MIGRATIONS)
}

/// Brings the ledger schema up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this binary.
/// - `Migration` when a script fails; nothing from the run is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    upgrade(conn, MIGRATIONS)
}

fn latest_in(set: &[Migration]) -> u32 {
    set.last().map_or(0, |migration| migration.version)
}

fn upgrade(conn: &mut Connection, set: &[Migration]) -> DbResult<()> {
    let from = current_user_version(conn)?;
    let to = latest_in(set);
    if from > to {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        });
    }

    let pending: Vec<&Migration> = set.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        if let Err(err) = run_one(&tx, migration) {
            error!(
                "event=db_migrate module=db status=error version={} name={} error_code={} error={err}",
                migration.version,
                migration.name,
                err.code()
            );
            return Err(err);
        }
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={from} to={to}");
    Ok(())
}

fn run_one(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    tx.execute_batch(migration.sql)
        .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
        .map_err(|source| DbError::Migration {
            version: migration.version,
            source,
        })
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
