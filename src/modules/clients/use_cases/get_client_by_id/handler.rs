use crate::modules::clients::core::ports::ClientRepository;
use crate::modules::clients::use_cases::application_error::ApplicationError;
use crate::modules::clients::use_cases::client_view::ClientView;
use crate::modules::clients::use_cases::get_client_by_id::query::GetClientById;
use std::sync::Arc;
use tracing::debug;

pub struct GetClientByIdHandler {
    repository: Arc<dyn ClientRepository>,
}

impl GetClientByIdHandler {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetClientById) -> Result<ClientView, ApplicationError> {
        debug!(client_id = %query.client_id, "Looking up client by id");
        self.repository
            .find_by_id(query.client_id)
            .await?
            .map(|client| ClientView::from(&client))
            .ok_or(ApplicationError::NotFound(query.client_id))
    }
}
