// In-process publish/subscribe.
//
// Purpose
// - Deliver a domain event, given in its stored (type tag, JSON) form, to every handler
//   subscribed to its type.
//
// Responsibilities
// - The registry maps EVENT_TYPE to a decoder and a handler list. It is built once at
//   startup and immutable afterwards.
// - Every handler runs even when an earlier one fails; the first failure is returned.

use crate::shared::core::domain_event::DomainEvent;
use async_trait::async_trait;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync + 'static {
    async fn handle(&self, event: &E) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no subscriber registration for event type {0}")]
    UnknownEventType(String),

    #[error("failed to decode {event_type}: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("handler {handler} failed for {event_type}: {reason}")]
    Handler {
        event_type: String,
        handler: &'static str,
        reason: String,
    },
}

impl PublishError {
    /// An unknown type tag cannot resolve until the registry changes, which needs a restart.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PublishError::Handler { .. } | PublishError::Decode { .. }
        )
    }
}

/// Publishing port used by the outbox dispatcher.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_serialized(&self, event_type: &str, data: &str) -> Result<(), PublishError>;
}

type AnyEvent = Box<dyn Any + Send + Sync>;
type Decoder = fn(&str) -> Result<AnyEvent, serde_json::Error>;

fn decode<E: DomainEvent>(data: &str) -> Result<AnyEvent, serde_json::Error> {
    Ok(Box::new(serde_json::from_str::<E>(data)?))
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle_any(&self, event: &(dyn Any + Send + Sync)) -> anyhow::Result<()>;
}

struct Typed<E, H> {
    handler: H,
    _event: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, H> ErasedHandler for Typed<E, H>
where
    E: DomainEvent,
    H: EventHandler<E>,
{
    fn name(&self) -> &'static str {
        type_name::<H>()
    }

    async fn handle_any(&self, event: &(dyn Any + Send + Sync)) -> anyhow::Result<()> {
        let event = event
            .downcast_ref::<E>()
            .ok_or_else(|| anyhow::anyhow!("event is not a {}", type_name::<E>()))?;
        self.handler.handle(event).await
    }
}

struct Route {
    decoder: Decoder,
    handlers: Vec<Arc<dyn ErasedHandler>>,
}

#[derive(Default)]
pub struct EventBusBuilder {
    routes: HashMap<&'static str, Route>,
}

impl EventBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `E` decodable from storage even when nothing subscribes to it yet.
    pub fn register<E: DomainEvent>(mut self) -> Self {
        self.routes.entry(E::EVENT_TYPE).or_insert_with(|| Route {
            decoder: decode::<E>,
            handlers: Vec::new(),
        });
        self
    }

    pub fn subscribe<E, H>(self, handler: H) -> Self
    where
        E: DomainEvent,
        H: EventHandler<E>,
    {
        let mut builder = self.register::<E>();
        if let Some(route) = builder.routes.get_mut(E::EVENT_TYPE) {
            route.handlers.push(Arc::new(Typed::<E, H> {
                handler,
                _event: PhantomData,
            }));
        }
        builder
    }

    pub fn build(self) -> EventBus {
        EventBus {
            routes: self.routes,
        }
    }
}

pub struct EventBus {
    routes: HashMap<&'static str, Route>,
}

impl EventBus {
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.routes
            .get(event_type)
            .map_or(0, |route| route.handlers.len())
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.routes.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

async fn dispatch(
    event_type: &str,
    handlers: &[Arc<dyn ErasedHandler>],
    event: &(dyn Any + Send + Sync),
) -> Result<(), PublishError> {
    let mut first_error = None;
    for handler in handlers {
        if let Err(e) = handler.handle_any(event).await {
            warn!(event_type, handler = handler.name(), error = %format!("{e:#}"), "Event handler failed");
            first_error.get_or_insert(PublishError::Handler {
                event_type: event_type.to_string(),
                handler: handler.name(),
                reason: format!("{e:#}"),
            });
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish_serialized(&self, event_type: &str, data: &str) -> Result<(), PublishError> {
        let route = self
            .routes
            .get(event_type)
            .ok_or_else(|| PublishError::UnknownEventType(event_type.to_string()))?;
        let event = (route.decoder)(data).map_err(|source| PublishError::Decode {
            event_type: event_type.to_string(),
            source,
        })?;
        debug!(event_type, handlers = route.handlers.len(), "Dispatching event");
        dispatch(event_type, &route.handlers, &*event).await
    }
}
