// Domain event contract shared by every module.
//
// Purpose
// - Give every event an identity, a timestamp, a schema version and a stable type tag.
//
// Responsibilities
// - EventMetadata is assigned once at construction and never mutated afterwards.
// - EVENT_TYPE is the tag persisted in the outbox and used to resolve the event on dispatch.
//   Renaming a tag orphans every stored message carrying the old one.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

pub const INITIAL_EVENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    id: Uuid,
    occurred_on: DateTime<Utc>,
    version: u32,
}

impl EventMetadata {
    pub fn new() -> Self {
        // Storage keeps microseconds; truncating here keeps round trips lossless.
        Self::with(Uuid::now_v7(), Utc::now().trunc_subsecs(6), INITIAL_EVENT_VERSION)
    }

    pub fn with(id: Uuid, occurred_on: DateTime<Utc>, version: u32) -> Self {
        Self {
            id,
            occurred_on,
            version,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn occurred_on(&self) -> DateTime<Utc> {
        self.occurred_on
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A fact recorded by an entity as a side effect of a state change.
pub trait DomainEvent:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    const EVENT_TYPE: &'static str;

    fn metadata(&self) -> &EventMetadata;

    fn event_id(&self) -> Uuid {
        self.metadata().id()
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        self.metadata().occurred_on()
    }
}

/// Events recorded by an entity and not yet handed to the outbox.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecorder<E> {
    pending: Vec<E>,
}

impl<E> EventRecorder<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<E> Default for EventRecorder<E> {
    fn default() -> Self {
        Self::new()
    }
}
