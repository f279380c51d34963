//! Async SQLite access on a dedicated executor thread.
//!
//! Every statement runs inside `call` or `transaction`, which hand a closure to the
//! `tokio-rusqlite` background thread. Only SQL and light row mapping belong inside
//! those closures.

pub mod error;
pub mod migrations;

pub use error::{DatabaseError, DatabaseResult};

use chrono::{DateTime, Utc};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> DatabaseError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => DatabaseError::Sqlite(e),
        tokio_rusqlite::Error::ConnectionClosed => {
            DatabaseError::Connection("Connection closed".to_string())
        }
        other => DatabaseError::Connection(other.to_string()),
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Connection,
    path: String,
}

impl SqliteDatabase {
    /// Opens (or creates) the database file, applies pragmas and pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "Opening database");

        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Self::initialize(conn, path_str).await
    }

    pub async fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Self::initialize(conn, ":memory:".to_string()).await
    }

    async fn initialize(conn: Connection, path: String) -> DatabaseResult<Self> {
        let db = Self { conn, path };
        db.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            migrations::run_migrations(conn)
        })
        .await?;
        info!(path = %db.path, "Database initialized");
        Ok(db)
    }

    /// Runs `f` on the executor thread and awaits its result.
    pub async fn call<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        match self.conn.call(move |conn| Ok(f(conn))).await {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    /// Runs `f` inside a transaction. Commits when `f` returns `Ok`, rolls back otherwise.
    pub async fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DatabaseError> + Send + 'static,
    {
        let result = self
            .conn
            .call(move |conn| Ok(run_in_transaction(conn, f)))
            .await;
        match result {
            Ok(inner) => inner,
            Err(e) => Err(E::from(from_tokio_rusqlite(e))),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.call(|conn| {
            conn.execute_batch("SELECT 1")?;
            Ok(())
        })
        .await?;
        debug!("Database health check passed");
        Ok(())
    }
}

fn run_in_transaction<F, T, E>(conn: &mut rusqlite::Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, E>,
    E: From<DatabaseError>,
{
    let tx = conn.transaction().map_err(DatabaseError::from)?;
    // Dropping `tx` without commit rolls it back.
    let value = f(&tx)?;
    tx.commit().map_err(DatabaseError::from)?;
    Ok(value)
}

pub fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub fn from_micros(micros: i64) -> DatabaseResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| DatabaseError::InvalidData(format!("timestamp out of range: {micros}")))
}

#[cfg(test)]
mod sqlite_database_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_open_and_migrate_an_in_memory_database() {
        let db = SqliteDatabase::open_in_memory().await.unwrap();
        db.health_check().await.unwrap();
        let count: i64 = db
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM outbox_messages", [], |row| {
                    row.get(0)
                })?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_roll_back_when_the_closure_fails() {
        let db = SqliteDatabase::open_in_memory().await.unwrap();
        let result: DatabaseResult<()> = db
            .transaction(|tx| {
                tx.execute(
                    "INSERT INTO products (id, name, created_at) VALUES ('p-1', 'Lamp', 0)",
                    [],
                )?;
                Err(DatabaseError::InvalidData("boom".to_string()))
            })
            .await;
        assert!(result.is_err());

        let count: i64 = db
            .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_open_a_file_database_in_a_new_directory() {
        let dir = std::env::temp_dir().join(format!("storefront-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("store.db");
        let db = SqliteDatabase::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.to_string_lossy());
        drop(db);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[rstest]
    fn it_should_round_trip_microsecond_timestamps() {
        let at = DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap();
        assert_eq!(from_micros(to_micros(at)).unwrap(), at);
        assert!(from_micros(i64::MAX).is_err());
    }
}
