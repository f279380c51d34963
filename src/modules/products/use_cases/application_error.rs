use crate::modules::products::core::ports::ProductRepositoryError;
use crate::modules::products::core::product::ProductError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain rejected: {0}")]
    Domain(#[from] ProductError),

    #[error(transparent)]
    Repository(#[from] ProductRepositoryError),
}
