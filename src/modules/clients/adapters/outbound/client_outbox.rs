use crate::modules::clients::core::events::ClientEvent;
use crate::shared::infrastructure::outbox::OutboxError;
use crate::shared::infrastructure::outbox::message_factory::create_from;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;

/// Translate the client's recorded events into outbox messages on `writer`.
/// A serialization failure aborts before anything is staged.
pub fn stage_client_events(
    writer: &mut OutboxWriter,
    events: &[ClientEvent],
) -> Result<(), OutboxError> {
    let messages = events
        .iter()
        .map(|event| match event {
            ClientEvent::Created(e) => create_from(e),
            ClientEvent::EmailChanged(e) => create_from(e),
        })
        .collect::<Result<Vec<_>, _>>()?;
    for message in messages {
        writer.add(message);
    }
    Ok(())
}
