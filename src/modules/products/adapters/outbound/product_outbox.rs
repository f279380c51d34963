use crate::modules::products::core::events::ProductEvent;
use crate::shared::infrastructure::outbox::OutboxError;
use crate::shared::infrastructure::outbox::message_factory::create_from;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;

pub fn stage_product_events(
    writer: &mut OutboxWriter,
    events: &[ProductEvent],
) -> Result<(), OutboxError> {
    let messages = events
        .iter()
        .map(|event| match event {
            ProductEvent::Created(e) => create_from(e),
        })
        .collect::<Result<Vec<_>, _>>()?;
    for message in messages {
        writer.add(message);
    }
    Ok(())
}
