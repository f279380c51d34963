use crate::modules::products::core::product::ProductId;
use crate::shared::core::domain_event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub product_id: ProductId,
    pub name: String,
}

impl ProductCreated {
    pub fn new(product_id: ProductId, name: impl Into<String>) -> Self {
        Self {
            metadata: EventMetadata::new(),
            product_id,
            name: name.into(),
        }
    }
}

impl DomainEvent for ProductCreated {
    const EVENT_TYPE: &'static str = "products.product_created";

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductEvent {
    Created(ProductCreated),
}
