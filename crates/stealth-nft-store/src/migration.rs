//! Database schema migrations for SQLite.
//!
//! Each migration is a SQL batch that moves the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::now_millis;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: calling it on an up-to-date database does nothing.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Key registry: one key per account, overwritten on re-registration
        CREATE TABLE public_keys (
            account BLOB PRIMARY KEY,         -- 20 bytes
            x BLOB NOT NULL,                  -- 32 bytes, big-endian
            y BLOB NOT NULL,                  -- 32 bytes, big-endian
            updated_at INTEGER NOT NULL
        );

        -- Token ownership
        CREATE TABLE tokens (
            token_id INTEGER PRIMARY KEY,     -- u64 stored bit-for-bit as i64
            owner BLOB NOT NULL               -- 20 bytes
        );

        -- Single approved address per token, cleared on transfer
        CREATE TABLE token_approvals (
            token_id INTEGER PRIMARY KEY,
            approved BLOB NOT NULL
        );

        -- Operators allowed to manage all tokens of an owner
        CREATE TABLE operator_approvals (
            owner BLOB NOT NULL,
            operator BLOB NOT NULL,
            PRIMARY KEY (owner, operator)
        );

        -- Append-only record log
        CREATE TABLE transfer_records (
            seq INTEGER PRIMARY KEY,          -- 1, 2, 3, ... no gaps
            stealth_address BLOB NOT NULL,    -- 20 bytes
            ephemeral_x BLOB NOT NULL,        -- 32 bytes
            ephemeral_y BLOB NOT NULL,        -- 32 bytes
            recorded_at INTEGER NOT NULL
        );

        CREATE INDEX idx_tokens_owner ON tokens(owner);
        "#,
    )?;

    Ok(())
}
