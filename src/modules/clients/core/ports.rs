use crate::modules::clients::core::client::{Client, ClientId};
use crate::shared::infrastructure::database::DatabaseError;
use crate::shared::infrastructure::outbox::OutboxError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientRepositoryError {
    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error(transparent)]
    Outbox(#[from] OutboxError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Writes the client and its pending events in one unit of work, then clears the events.
    /// On error nothing is written and the events stay pending.
    async fn save(&self, client: &mut Client) -> Result<(), ClientRepositoryError>;

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, ClientRepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientRepositoryError>;
}
