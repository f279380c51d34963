use crate::modules::clients::core::ports::ClientRepository;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::client_view::ClientView;
use crate::modules::clients::use_cases::get_client_by_email::query::GetClientByEmail;
use std::sync::Arc;
use tracing::debug;

pub struct GetClientByEmailHandler {
    repository: Arc<dyn ClientRepository>,
}

impl GetClientByEmailHandler {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    /// `Ok(None)` when no client owns the address.
    pub async fn handle(
        &self,
        query: GetClientByEmail,
    ) -> Result<Option<ClientView>, ApplicationError> {
        debug!("Looking up client by email");
        let client = self.repository.find_by_email(&query.email).await?;
        Ok(client.as_ref().map(ClientView::from))
    }
}
