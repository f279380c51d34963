use crate::modules::products::core::product::{Product, ProductId};
use crate::shared::infrastructure::database::DatabaseError;
use crate::shared::infrastructure::outbox::OutboxError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductRepositoryError {
    #[error(transparent)]
    Outbox(#[from] OutboxError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Same contract as the client repository: entity and events commit together.
    async fn save(&self, product: &mut Product) -> Result<(), ProductRepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError>;
}
