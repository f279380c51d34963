use crate::modules::clients::core::client::{Client, ClientId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read model returned by the client queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientView {
    pub client_id: ClientId,
    pub email: String,
    pub registered_at: DateTime<Utc>,
    pub email_updated_at: DateTime<Utc>,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.id(),
            email: client.email().to_string(),
            registered_at: client.registered_at(),
            email_updated_at: client.email_updated_at(),
        }
    }
}
