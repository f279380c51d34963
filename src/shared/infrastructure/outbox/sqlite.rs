use crate::shared::infrastructure::database::{
    DatabaseError, DatabaseResult, SqliteDatabase, to_micros,
};
use crate::shared::infrastructure::outbox::{
    OutboxError, OutboxMessage, OutboxStore, RetentionSettings, RetentionSettingsStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{ErrorCode, OptionalExtension, Row, Transaction, params};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, occurred_on, type, data, processed_date, attempts, last_error, dead_lettered_at";

impl From<rusqlite::Error> for OutboxError {
    fn from(e: rusqlite::Error) -> Self {
        OutboxError::Database(DatabaseError::Sqlite(e))
    }
}

/// Inserts `messages` inside the caller's transaction, so entity rows and their events
/// commit or roll back together.
pub fn insert_messages(
    tx: &Transaction<'_>,
    messages: &[OutboxMessage],
) -> Result<(), OutboxError> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO outbox_messages
            (id, occurred_on, type, data, processed_date, attempts, last_error, dead_lettered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for message in messages {
        let inserted = stmt.execute(params![
            message.id.to_string(),
            to_micros(message.occurred_on),
            message.event_type,
            message.data,
            message.processed_date.map(to_micros),
            message.attempts,
            message.last_error,
            message.dead_lettered_at.map(to_micros),
        ]);
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(OutboxError::Duplicate { id: message.id });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn conversion_error(
    idx: usize,
    ty: Type,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let micros: Option<i64> = row.get(idx)?;
    micros
        .map(|v| {
            DateTime::from_timestamp_micros(v).ok_or_else(|| {
                conversion_error(
                    idx,
                    Type::Integer,
                    DatabaseError::InvalidData(format!("timestamp out of range: {v}")),
                )
            })
        })
        .transpose()
}

fn read_message(row: &Row<'_>) -> rusqlite::Result<OutboxMessage> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| conversion_error(0, Type::Text, e))?;
    let occurred_on = timestamp_at(row, 1)?.ok_or_else(|| {
        conversion_error(
            1,
            Type::Null,
            DatabaseError::InvalidData("occurred_on is null".to_string()),
        )
    })?;
    Ok(OutboxMessage {
        id,
        occurred_on,
        event_type: row.get(2)?,
        data: row.get(3)?,
        processed_date: timestamp_at(row, 4)?,
        attempts: row.get(5)?,
        last_error: row.get(6)?,
        dead_lettered_at: timestamp_at(row, 7)?,
    })
}

#[derive(Clone)]
pub struct SqliteOutboxStore {
    db: SqliteDatabase,
}

impl SqliteOutboxStore {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<OutboxMessage>, OutboxError> {
        let message = self
            .db
            .call(move |conn| {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM outbox_messages WHERE id = ?1");
                Ok(conn
                    .query_row(&sql, [id.to_string()], read_message)
                    .optional()?)
            })
            .await?;
        Ok(message)
    }
}

#[async_trait]
impl OutboxStore for SqliteOutboxStore {
    async fn insert_all(&self, messages: &[OutboxMessage]) -> Result<(), OutboxError> {
        let messages = messages.to_vec();
        self.db
            .transaction(move |tx| insert_messages(tx, &messages))
            .await
    }

    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxMessage>, OutboxError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let messages = self
            .db
            .call(move |conn| {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM outbox_messages
                     WHERE processed_date IS NULL AND dead_lettered_at IS NULL
                     ORDER BY occurred_on ASC, id ASC
                     LIMIT ?1"
                );
                let mut stmt = conn.prepare_cached(&sql)?;
                let rows = stmt.query_map([limit], read_message)?;
                let messages: DatabaseResult<Vec<_>> =
                    rows.map(|r| r.map_err(DatabaseError::from)).collect();
                messages
            })
            .await?;
        Ok(messages)
    }

    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError> {
        self.db
            .call(move |conn| {
                conn.execute(
                    "UPDATE outbox_messages
                     SET processed_date = COALESCE(processed_date, ?2)
                     WHERE id = ?1",
                    params![id.to_string(), to_micros(at)],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<u32, OutboxError> {
        let error = error.to_string();
        let attempts = self
            .db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "UPDATE outbox_messages
                         SET attempts = attempts + 1, last_error = ?2
                         WHERE id = ?1
                         RETURNING attempts",
                        params![id.to_string(), error],
                        |row| row.get::<_, u32>(0),
                    )
                    .optional()?)
            })
            .await?;
        attempts.ok_or_else(|| OutboxError::Backend(format!("outbox message {id} not found")))
    }

    async fn dead_letter(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError> {
        self.db
            .call(move |conn| {
                conn.execute(
                    "UPDATE outbox_messages
                     SET dead_lettered_at = COALESCE(dead_lettered_at, ?2)
                     WHERE id = ?1 AND processed_date IS NULL",
                    params![id.to_string(), to_micros(at)],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn delete_processed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OutboxError> {
        let removed = self
            .db
            .call(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM outbox_messages
                     WHERE processed_date IS NOT NULL AND processed_date < ?1",
                    [to_micros(cutoff)],
                )?)
            })
            .await?;
        Ok(removed as u64)
    }

    async fn pending_count(&self) -> Result<u64, OutboxError> {
        let count = self
            .db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM outbox_messages
                     WHERE processed_date IS NULL AND dead_lettered_at IS NULL",
                    [],
                    |row| row.get::<_, i64>(0),
                )?)
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl RetentionSettingsStore for SqliteOutboxStore {
    async fn load(&self) -> Result<RetentionSettings, OutboxError> {
        let settings = self
            .db
            .call(|conn| {
                Ok(conn
                    .query_row(
                        "SELECT retention_days, enabled FROM outbox_retention_config WHERE id = 1",
                        [],
                        |row| {
                            Ok(RetentionSettings {
                                retention_days: row.get(0)?,
                                enabled: row.get(1)?,
                            })
                        },
                    )
                    .optional()?)
            })
            .await?;
        Ok(settings.unwrap_or_default())
    }

    async fn set_retention_days(&self, days: i64) -> Result<(), OutboxError> {
        let defaults = RetentionSettings::default();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO outbox_retention_config (id, retention_days, enabled)
                     VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET retention_days = excluded.retention_days",
                    params![days, defaults.enabled],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), OutboxError> {
        let defaults = RetentionSettings::default();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO outbox_retention_config (id, retention_days, enabled)
                     VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET enabled = excluded.enabled",
                    params![defaults.retention_days, enabled],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
