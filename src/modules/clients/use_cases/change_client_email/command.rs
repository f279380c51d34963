use crate::modules::clients::core::client::ClientId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeClientEmail {
    pub client_id: ClientId,
    pub new_email: String,
}
