use crate::modules::clients::core::events::{ClientCreated, ClientEmailChanged};
use crate::shared::core::domain_event::DomainEvent;
use crate::shared::infrastructure::event_bus::{EventBusBuilder, EventHandler};
use async_trait::async_trait;
use tracing::info;

/// Reacts to a new client. Mail delivery lives outside this service.
pub struct SendWelcomeEmail;

#[async_trait]
impl EventHandler<ClientCreated> for SendWelcomeEmail {
    async fn handle(&self, event: &ClientCreated) -> anyhow::Result<()> {
        info!(
            event_id = %event.event_id(),
            client_id = %event.client_id,
            email = %event.email,
            "Queued welcome email"
        );
        Ok(())
    }
}

pub struct NotifyEmailChanged;

#[async_trait]
impl EventHandler<ClientEmailChanged> for NotifyEmailChanged {
    async fn handle(&self, event: &ClientEmailChanged) -> anyhow::Result<()> {
        info!(
            event_id = %event.event_id(),
            client_id = %event.client_id,
            old_email = %event.old_email,
            new_email = %event.new_email,
            "Queued email change notice"
        );
        Ok(())
    }
}

pub fn subscribe(builder: EventBusBuilder) -> EventBusBuilder {
    builder
        .subscribe::<ClientCreated, _>(SendWelcomeEmail)
        .subscribe::<ClientEmailChanged, _>(NotifyEmailChanged)
}
