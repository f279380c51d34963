use crate::modules::clients::core::client::{Client, ClientId};
use crate::modules::clients::core::ports::ClientRepository;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::register_client::command::RegisterClient;
use std::sync::Arc;
use tracing::info;

pub struct RegisterClientHandler {
    repository: Arc<dyn ClientRepository>,
}

impl RegisterClientHandler {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, command: RegisterClient) -> Result<ClientId, ApplicationError> {
        if self
            .repository
            .find_by_email(&command.email)
            .await?
            .is_some()
        {
            return Err(ApplicationError::EmailTaken(command.email.trim().to_string()));
        }
        let mut client = Client::register(&command.email)?;
        self.repository.save(&mut client).await?;
        info!(client_id = %client.id(), "Client registered");
        Ok(client.id())
    }
}
