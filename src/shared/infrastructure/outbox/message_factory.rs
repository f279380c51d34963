use crate::shared::core::domain_event::DomainEvent;
use crate::shared::infrastructure::outbox::{OutboxError, OutboxMessage};

/// Builds the stored form of `event`. The message id is the event id, so writing the same
/// event twice is rejected as a duplicate.
pub fn create_from<E: DomainEvent>(event: &E) -> Result<OutboxMessage, OutboxError> {
    let data = serde_json::to_string(event).map_err(|source| OutboxError::Serialization {
        event_type: E::EVENT_TYPE.to_string(),
        source,
    })?;
    Ok(OutboxMessage::new(
        event.event_id(),
        event.occurred_on(),
        E::EVENT_TYPE,
        data,
    ))
}
