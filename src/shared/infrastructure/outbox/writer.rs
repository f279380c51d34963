use crate::shared::infrastructure::outbox::{OutboxError, OutboxMessage, OutboxStore};
use std::future::Future;
use tracing::debug;

/// Per unit-of-work buffer of messages waiting to be persisted.
///
/// The stage is cleared only once the commit has been confirmed, so a failed save can be
/// retried with the same messages.
#[derive(Debug, Default)]
pub struct OutboxWriter {
    staged: Vec<OutboxMessage>,
}

impl OutboxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: OutboxMessage) {
        self.staged.push(message);
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn staged(&self) -> &[OutboxMessage] {
        &self.staged
    }

    /// Persists the stage on its own. Completes immediately when nothing is staged.
    pub async fn save(&mut self, store: &dyn OutboxStore) -> Result<(), OutboxError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        self.commit_with(|staged| async move { store.insert_all(&staged).await })
            .await
    }

    /// Hands a copy of the stage to `commit`, which writes it together with the entity in
    /// one transaction. `commit` runs even when the stage is empty.
    pub async fn commit_with<F, Fut, T, E>(&mut self, commit: F) -> Result<T, E>
    where
        F: FnOnce(Vec<OutboxMessage>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = commit(self.staged.clone()).await?;
        debug!(count = self.staged.len(), "Outbox messages committed");
        self.staged.clear();
        Ok(value)
    }
}
