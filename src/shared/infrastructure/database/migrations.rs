// Versioned schema for the SQLite backend.
//
// Timestamps are INTEGER microseconds since the Unix epoch so that ordering and range
// deletes stay plain integer comparisons.

use crate::shared::infrastructure::database::error::DatabaseResult;
use rusqlite::Connection;
use tracing::{debug, info};

pub const CURRENT_VERSION: i32 = 3;

pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    info!(
        current_version,
        target_version = CURRENT_VERSION,
        "Running migrations"
    );

    if current_version < 1 {
        migrate_v1_outbox(conn)?;
    }
    if current_version < 2 {
        migrate_v2_outbox_dead_letter(conn)?;
    }
    if current_version < 3 {
        migrate_v3_catalog(conn)?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

fn migrate_v1_outbox(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE outbox_messages (
            id TEXT PRIMARY KEY NOT NULL,
            occurred_on INTEGER NOT NULL,
            type TEXT NOT NULL,
            data TEXT NOT NULL,
            processed_date INTEGER
        );

        CREATE INDEX idx_outbox_messages_processed_date
            ON outbox_messages (processed_date)
            WHERE processed_date IS NOT NULL;

        CREATE TABLE outbox_retention_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            retention_days INTEGER NOT NULL CHECK (retention_days >= 1),
            enabled INTEGER NOT NULL
        );

        INSERT INTO outbox_retention_config (id, retention_days, enabled) VALUES (1, 30, 1);
        ",
    )?;
    record_migration(conn, 1, "outbox")
}

fn migrate_v2_outbox_dead_letter(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        ALTER TABLE outbox_messages ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE outbox_messages ADD COLUMN last_error TEXT;
        ALTER TABLE outbox_messages ADD COLUMN dead_lettered_at INTEGER;

        CREATE INDEX idx_outbox_messages_pending
            ON outbox_messages (occurred_on)
            WHERE processed_date IS NULL AND dead_lettered_at IS NULL;
        ",
    )?;
    record_migration(conn, 2, "outbox_dead_letter")
}

fn migrate_v3_catalog(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE clients (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            registered_at INTEGER NOT NULL,
            email_updated_at INTEGER NOT NULL
        );

        CREATE TABLE products (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        ",
    )?;
    record_migration(conn, 3, "clients_and_products")
}
