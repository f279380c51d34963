use crate::modules::clients::core::events::{ClientCreated, ClientEmailChanged, ClientEvent};
use crate::shared::core::domain_event::EventRecorder;
use crate::shared::core::typed_id::TypedId;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

pub type ClientId = TypedId<Client>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("email must not be empty")]
    EmptyEmail,

    #[error("new email is the same as the current one")]
    EmailUnchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    id: ClientId,
    email: String,
    registered_at: DateTime<Utc>,
    email_updated_at: DateTime<Utc>,
    events: EventRecorder<ClientEvent>,
}

fn normalize(email: &str) -> Result<String, ClientError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ClientError::EmptyEmail);
    }
    Ok(email.to_string())
}

impl Client {
    pub fn register(email: &str) -> Result<Self, ClientError> {
        let email = normalize(email)?;
        let now = Utc::now().trunc_subsecs(6);
        let id = ClientId::new();
        let mut events = EventRecorder::new();
        events.record(ClientEvent::Created(ClientCreated::new(id, email.clone())));
        Ok(Self {
            id,
            email,
            registered_at: now,
            email_updated_at: now,
            events,
        })
    }

    /// Rebuilds a stored client. No events are recorded.
    pub fn restore(
        id: ClientId,
        email: String,
        registered_at: DateTime<Utc>,
        email_updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            registered_at,
            email_updated_at,
            events: EventRecorder::new(),
        }
    }

    pub fn change_email(&mut self, new_email: &str) -> Result<(), ClientError> {
        let new_email = normalize(new_email)?;
        if new_email == self.email {
            return Err(ClientError::EmailUnchanged);
        }
        let old_email = std::mem::replace(&mut self.email, new_email.clone());
        self.email_updated_at = Utc::now().trunc_subsecs(6);
        self.events.record(ClientEvent::EmailChanged(ClientEmailChanged::new(
            self.id, old_email, new_email,
        )));
        Ok(())
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn email_updated_at(&self) -> DateTime<Utc> {
        self.email_updated_at
    }

    pub fn pending_events(&self) -> &[ClientEvent] {
        self.events.pending()
    }

    /// Called by repositories once the events are durably in the outbox.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
