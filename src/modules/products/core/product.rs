use crate::modules::products::core::events::{ProductCreated, ProductEvent};
use crate::shared::core::domain_event::EventRecorder;
use crate::shared::core::typed_id::TypedId;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

pub type ProductId = TypedId<Product>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    #[error("product name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    created_at: DateTime<Utc>,
    events: EventRecorder<ProductEvent>,
}

impl Product {
    pub fn create(name: &str) -> Result<Self, ProductError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        let id = ProductId::new();
        let mut events = EventRecorder::new();
        events.record(ProductEvent::Created(ProductCreated::new(id, name)));
        Ok(Self {
            id,
            name: name.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
            events,
        })
    }

    pub fn restore(id: ProductId, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
            events: EventRecorder::new(),
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn pending_events(&self) -> &[ProductEvent] {
        self.events.pending()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
