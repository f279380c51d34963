// Transactional outbox.
//
// Purpose
// - Persist domain events in the same unit of work as the entity that produced them, then
//   deliver them asynchronously to in-process subscribers (at-least-once).
//
// Responsibilities
// - OutboxMessage is the stored form of one event, keyed by the event id.
// - OutboxStore is the persistence port used by the writer, dispatcher and cleanup.
// - RetentionSettingsStore holds the singleton retention configuration.
//
// Lifecycle of a message: pending -> processed, or pending -> dead-lettered.
// Both end states are terminal; processed_date is never cleared once set.

use crate::shared::infrastructure::database::DatabaseError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod circuit_breaker;
pub mod cleanup;
pub mod config;
pub mod dispatcher;
pub mod in_memory;
pub mod message_factory;
pub mod retry;
pub mod sqlite;
pub mod writer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub event_type: String,
    pub data: String,
    pub processed_date: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub dead_lettered_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    pub fn new(
        id: Uuid,
        occurred_on: DateTime<Utc>,
        event_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id,
            occurred_on,
            event_type: event_type.into(),
            data: data.into(),
            processed_date: None,
            attempts: 0,
            last_error: None,
            dead_lettered_at: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_date.is_some()
    }

    pub fn is_dead_lettered(&self) -> bool {
        self.dead_lettered_at.is_some()
    }

    pub fn is_pending(&self) -> bool {
        !self.is_processed() && !self.is_dead_lettered()
    }
}

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("failed to serialize event {event_type}: {source}")]
    Serialization {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate outbox message {id}")]
    Duplicate { id: Uuid },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionSettings {
    pub retention_days: i64,
    pub enabled: bool,
}

impl RetentionSettings {
    pub const DEFAULT_RETENTION_DAYS: i64 = 30;
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            retention_days: Self::DEFAULT_RETENTION_DAYS,
            enabled: true,
        }
    }
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Persists every message or none of them.
    async fn insert_all(&self, messages: &[OutboxMessage]) -> Result<(), OutboxError>;

    /// Pending messages (not processed, not dead-lettered) ordered by `occurred_on` ascending.
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxMessage>, OutboxError>;

    /// Sets `processed_date` unless it is already set.
    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError>;

    /// Increments the failure counter and returns its new value.
    async fn record_failure(&self, id: Uuid, error: &str) -> Result<u32, OutboxError>;

    async fn dead_letter(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError>;

    /// Deletes processed messages whose `processed_date` is strictly before `cutoff`.
    async fn delete_processed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OutboxError>;

    async fn pending_count(&self) -> Result<u64, OutboxError>;
}

#[async_trait]
pub trait RetentionSettingsStore: Send + Sync {
    async fn load(&self) -> Result<RetentionSettings, OutboxError>;
    async fn set_retention_days(&self, days: i64) -> Result<(), OutboxError>;
    async fn set_enabled(&self, enabled: bool) -> Result<(), OutboxError>;
}

#[cfg(test)]
mod outbox_message_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn it_should_start_pending() {
        let message = OutboxMessage::new(Uuid::now_v7(), Utc::now(), "tests.sample", "{}");
        assert!(message.is_pending());
        assert!(!message.is_processed());
        assert!(!message.is_dead_lettered());
        assert_eq!(message.attempts, 0);
    }

    #[rstest]
    fn it_should_leave_pending_once_processed_or_dead_lettered() {
        let mut processed = OutboxMessage::new(Uuid::now_v7(), Utc::now(), "tests.sample", "{}");
        processed.processed_date = Some(Utc::now());
        assert!(!processed.is_pending());

        let mut dead = OutboxMessage::new(Uuid::now_v7(), Utc::now(), "tests.sample", "{}");
        dead.dead_lettered_at = Some(Utc::now());
        assert!(!dead.is_pending());
        assert!(dead.is_dead_lettered());
    }

    #[rstest]
    fn it_should_default_retention_to_thirty_days_enabled() {
        let settings = RetentionSettings::default();
        assert_eq!(settings.retention_days, 30);
        assert!(settings.enabled);
    }
}
