use crate::modules::clients::use_cases::change_client_email::handler::ChangeClientEmailHandler;
use crate::modules::clients::use_cases::get_client_by_email::handler::GetClientByEmailHandler;
use crate::modules::clients::use_cases::get_client_by_id::handler::GetClientByIdHandler;
use crate::modules::clients::use_cases::register_client::handler::RegisterClientHandler;
use crate::modules::products::use_cases::create_product::handler::CreateProductHandler;
use crate::shared::infrastructure::outbox::OutboxStore;
use crate::shared::infrastructure::outbox::circuit_breaker::CircuitBreaker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub register_client: Arc<RegisterClientHandler>,
    pub change_client_email: Arc<ChangeClientEmailHandler>,
    pub get_client_by_id: Arc<GetClientByIdHandler>,
    pub get_client_by_email: Arc<GetClientByEmailHandler>,
    pub create_product: Arc<CreateProductHandler>,
    pub outbox: Arc<dyn OutboxStore>,
    pub breaker: Arc<CircuitBreaker>,
}
