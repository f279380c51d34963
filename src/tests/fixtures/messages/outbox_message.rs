// Builder for stored outbox messages in arbitrary states.

use crate::shared::infrastructure::outbox::OutboxMessage;
use crate::shared::infrastructure::outbox::message_factory::create_from;
use crate::tests::fixtures::events::sample_event::SampleHappened;
use chrono::{DateTime, Utc};

pub struct OutboxMessageBuilder {
    inner: OutboxMessage,
}

impl Default for OutboxMessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboxMessageBuilder {
    pub fn new() -> Self {
        Self::from_event(&SampleHappened::new("fixture"))
    }

    pub fn from_event(event: &SampleHappened) -> Self {
        Self {
            inner: create_from(event).unwrap(),
        }
    }

    pub fn occurred_on(mut self, at: DateTime<Utc>) -> Self {
        self.inner.occurred_on = at;
        self
    }

    pub fn event_type(mut self, v: impl Into<String>) -> Self {
        self.inner.event_type = v.into();
        self
    }

    pub fn data(mut self, v: impl Into<String>) -> Self {
        self.inner.data = v.into();
        self
    }

    pub fn processed_at(mut self, at: DateTime<Utc>) -> Self {
        self.inner.processed_date = Some(at);
        self
    }

    pub fn dead_lettered_at(mut self, at: DateTime<Utc>) -> Self {
        self.inner.dead_lettered_at = Some(at);
        self
    }

    pub fn build(self) -> OutboxMessage {
        self.inner
    }
}
