use crate::shared::infrastructure::outbox::{
    OutboxError, OutboxMessage, OutboxStore, RetentionSettings, RetentionSettingsStore,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryOutboxStore {
    messages: Mutex<Vec<OutboxMessage>>,
    settings: Mutex<RetentionSettings>,
    is_offline: bool,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    pub async fn all(&self) -> Vec<OutboxMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<OutboxMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    fn ensure_online(&self) -> Result<(), OutboxError> {
        if self.is_offline {
            return Err(OutboxError::Backend("Outbox store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn insert_all(&self, messages: &[OutboxMessage]) -> Result<(), OutboxError> {
        self.ensure_online()?;
        let mut rows = self.messages.lock().await;
        let mut seen: HashSet<Uuid> = rows.iter().map(|m| m.id).collect();
        // Validate the whole batch before touching the rows.
        for message in messages {
            if !seen.insert(message.id) {
                return Err(OutboxError::Duplicate { id: message.id });
            }
        }
        rows.extend(messages.iter().cloned());
        Ok(())
    }

    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxMessage>, OutboxError> {
        self.ensure_online()?;
        let rows = self.messages.lock().await;
        let mut pending: Vec<OutboxMessage> =
            rows.iter().filter(|m| m.is_pending()).cloned().collect();
        pending.sort_by_key(|m| (m.occurred_on, m.id));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError> {
        self.ensure_online()?;
        let mut rows = self.messages.lock().await;
        if let Some(message) = rows.iter_mut().find(|m| m.id == id) {
            message.processed_date.get_or_insert(at);
        }
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<u32, OutboxError> {
        self.ensure_online()?;
        let mut rows = self.messages.lock().await;
        match rows.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.attempts += 1;
                message.last_error = Some(error.to_string());
                Ok(message.attempts)
            }
            None => Err(OutboxError::Backend(format!("outbox message {id} not found"))),
        }
    }

    async fn dead_letter(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OutboxError> {
        self.ensure_online()?;
        let mut rows = self.messages.lock().await;
        if let Some(message) = rows
            .iter_mut()
            .find(|m| m.id == id && m.processed_date.is_none())
        {
            message.dead_lettered_at.get_or_insert(at);
        }
        Ok(())
    }

    async fn delete_processed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OutboxError> {
        self.ensure_online()?;
        let mut rows = self.messages.lock().await;
        let before = rows.len();
        rows.retain(|m| !matches!(m.processed_date, Some(at) if at < cutoff));
        Ok((before - rows.len()) as u64)
    }

    async fn pending_count(&self) -> Result<u64, OutboxError> {
        self.ensure_online()?;
        let rows = self.messages.lock().await;
        Ok(rows.iter().filter(|m| m.is_pending()).count() as u64)
    }
}

#[async_trait::async_trait]
impl RetentionSettingsStore for InMemoryOutboxStore {
    async fn load(&self) -> Result<RetentionSettings, OutboxError> {
        self.ensure_online()?;
        Ok(*self.settings.lock().await)
    }

    async fn set_retention_days(&self, days: i64) -> Result<(), OutboxError> {
        self.ensure_online()?;
        self.settings.lock().await.retention_days = days;
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), OutboxError> {
        self.ensure_online()?;
        self.settings.lock().await.enabled = enabled;
        Ok(())
    }
}
