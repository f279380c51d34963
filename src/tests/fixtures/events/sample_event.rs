// Shared test event used wherever a concrete DomainEvent is needed without pulling in a
// business module.

use crate::shared::core::domain_event::{DomainEvent, EventMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleHappened {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub label: String,
}

impl SampleHappened {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            metadata: EventMetadata::new(),
            label: label.into(),
        }
    }

    pub fn at(label: impl Into<String>, occurred_on: DateTime<Utc>) -> Self {
        Self {
            metadata: EventMetadata::with(Uuid::now_v7(), occurred_on, 1),
            label: label.into(),
        }
    }
}

impl DomainEvent for SampleHappened {
    const EVENT_TYPE: &'static str = "tests.sample_happened";

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
