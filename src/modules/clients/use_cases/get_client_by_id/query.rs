use crate::modules::clients::core::client::ClientId;

#[derive(Debug, Clone, Copy)]
pub struct GetClientById {
    pub client_id: ClientId,
}
