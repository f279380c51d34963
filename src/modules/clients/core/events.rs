use crate::modules::clients::core::client::ClientId;
use crate::shared::core::domain_event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub client_id: ClientId,
    pub email: String,
}

impl ClientCreated {
    pub fn new(client_id: ClientId, email: impl Into<String>) -> Self {
        Self {
            metadata: EventMetadata::new(),
            client_id,
            email: email.into(),
        }
    }
}

impl DomainEvent for ClientCreated {
    const EVENT_TYPE: &'static str = "clients.client_created";

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEmailChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub client_id: ClientId,
    pub old_email: String,
    pub new_email: String,
}

impl ClientEmailChanged {
    pub fn new(
        client_id: ClientId,
        old_email: impl Into<String>,
        new_email: impl Into<String>,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(),
            client_id,
            old_email: old_email.into(),
            new_email: new_email.into(),
        }
    }
}

impl DomainEvent for ClientEmailChanged {
    const EVENT_TYPE: &'static str = "clients.client_email_changed";

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Created(ClientCreated),
    EmailChanged(ClientEmailChanged),
}
