use crate::modules::clients::core::ports::ClientRepository;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::change_client_email::command::ChangeClientEmail;
use std::sync::Arc;
use tracing::info;

pub struct ChangeClientEmailHandler {
    repository: Arc<dyn ClientRepository>,
}

impl ChangeClientEmailHandler {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, command: ChangeClientEmail) -> Result<(), ApplicationError> {
        let mut client = self
            .repository
            .find_by_id(command.client_id)
            .await?
            .ok_or(ApplicationError::NotFound(command.client_id))?;

        if let Some(owner) = self.repository.find_by_email(&command.new_email).await?
            && owner.id() != client.id()
        {
            return Err(ApplicationError::EmailTaken(owner.email().to_string()));
        }

        client.change_email(&command.new_email)?;
        self.repository.save(&mut client).await?;
        info!(client_id = %client.id(), "Client email changed");
        Ok(())
    }
}
