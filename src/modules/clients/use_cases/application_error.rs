use crate::modules::clients::core::client::{ClientError, ClientId};
use crate::modules::clients::core::ports::ClientRepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("client not found: {0}")]
    NotFound(ClientId),

    #[error("domain rejected: {0}")]
    Domain(#[from] ClientError),

    #[error(transparent)]
    Repository(ClientRepositoryError),
}

impl From<ClientRepositoryError> for ApplicationError {
    fn from(e: ClientRepositoryError) -> Self {
        match e {
            ClientRepositoryError::EmailTaken(email) => ApplicationError::EmailTaken(email),
            other => ApplicationError::Repository(other),
        }
    }
}
