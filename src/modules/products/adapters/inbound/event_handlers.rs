use crate::modules::products::core::events::ProductCreated;
use crate::shared::core::domain_event::DomainEvent;
use crate::shared::infrastructure::event_bus::{EventBusBuilder, EventHandler};
use async_trait::async_trait;
use tracing::info;

pub struct IndexNewProduct;

#[async_trait]
impl EventHandler<ProductCreated> for IndexNewProduct {
    async fn handle(&self, event: &ProductCreated) -> anyhow::Result<()> {
        info!(
            event_id = %event.event_id(),
            product_id = %event.product_id,
            name = %event.name,
            "Indexed new product"
        );
        Ok(())
    }
}

pub fn subscribe(builder: EventBusBuilder) -> EventBusBuilder {
    builder.subscribe::<ProductCreated, _>(IndexNewProduct)
}
