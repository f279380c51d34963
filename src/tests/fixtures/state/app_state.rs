use crate::modules::clients::adapters::outbound::client_repository_in_memory::InMemoryClientRepository;
use crate::modules::clients::use_cases::change_client_email::handler::ChangeClientEmailHandler;
use crate::modules::clients::use_cases::get_client_by_email::handler::GetClientByEmailHandler;
use crate::modules::clients::use_cases::get_client_by_id::handler::GetClientByIdHandler;
use crate::modules::clients::use_cases::register_client::handler::RegisterClientHandler;
use crate::modules::products::adapters::outbound::product_repository_in_memory::InMemoryProductRepository;
use crate::modules::products::use_cases::create_product::handler::CreateProductHandler;
use crate::shared::infrastructure::outbox::circuit_breaker::CircuitBreaker;
use crate::shared::infrastructure::outbox::in_memory::InMemoryOutboxStore;
use crate::shell::state::AppState;
use std::sync::Arc;

/// In-memory wiring for HTTP tests. With `offline` every repository rejects calls.
pub fn make_test_state(offline: bool) -> (AppState, Arc<InMemoryOutboxStore>) {
    let outbox = Arc::new(InMemoryOutboxStore::new());
    let mut clients = InMemoryClientRepository::new(outbox.clone());
    let mut products = InMemoryProductRepository::new(outbox.clone());
    if offline {
        clients.toggle_offline();
        products.toggle_offline();
    }
    let clients = Arc::new(clients);
    let state = AppState {
        register_client: Arc::new(RegisterClientHandler::new(clients.clone())),
        change_client_email: Arc::new(ChangeClientEmailHandler::new(clients.clone())),
        get_client_by_id: Arc::new(GetClientByIdHandler::new(clients.clone())),
        get_client_by_email: Arc::new(GetClientByEmailHandler::new(clients)),
        create_product: Arc::new(CreateProductHandler::new(Arc::new(products))),
        outbox: outbox.clone(),
        breaker: Arc::new(CircuitBreaker::default()),
    };
    (state, outbox)
}
