//! Event dispatch table and activity registry.
//!
//! Instead of attribute-style trigger registration resolved by a hosting
//! runtime, bindings here are explicit data: the host builds a
//! [`Dispatcher`] mapping each [`EventSource`] to a handler and an
//! [`ActivityRegistry`] mapping activity names to activity functions, then
//! calls `validate()` on both **before** serving anything. A missing
//! binding is a startup error, not a runtime surprise on the first upload.

use crate::error::{ActivityError, PipelineError};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The event sources the host reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// Periodic warmup tick.
    Timer,
    /// A new object appeared in the input store.
    BlobCreated,
    /// A workflow instance should start for a derived identifier.
    OrchestrationStart,
}

impl EventSource {
    pub const ALL: [EventSource; 3] = [
        EventSource::Timer,
        EventSource::BlobCreated,
        EventSource::OrchestrationStart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Timer => "timer",
            EventSource::BlobCreated => "new-blob",
            EventSource::OrchestrationStart => "orchestration-start",
        }
    }
}

/// A dispatchable event with its payload.
#[derive(Debug, Clone)]
pub enum Event {
    Timer,
    BlobCreated { path: String, size: u64 },
    OrchestrationStart { identifier: String },
}

impl Event {
    pub fn source(&self) -> EventSource {
        match self {
            Event::Timer => EventSource::Timer,
            Event::BlobCreated { .. } => EventSource::BlobCreated,
            Event::OrchestrationStart { .. } => EventSource::OrchestrationStart,
        }
    }
}

/// Handler bound to one event source.
pub type EventHandler =
    Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), PipelineError>> + Send + Sync>;

/// Explicit event-source → handler table.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<EventSource, EventHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `source`, replacing any previous binding.
    pub fn bind(&mut self, source: EventSource, handler: EventHandler) {
        self.handlers.insert(source, handler);
    }

    /// Every event source must be bound before the host starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for source in EventSource::ALL {
            if !self.handlers.contains_key(&source) {
                return Err(PipelineError::UnboundEvent {
                    event_source: source.as_str(),
                });
            }
        }
        Ok(())
    }

    /// Route `event` to its bound handler.
    pub async fn dispatch(&self, event: Event) -> Result<(), PipelineError> {
        let source = event.source();
        let handler = self
            .handlers
            .get(&source)
            .ok_or(PipelineError::UnboundEvent {
                event_source: source.as_str(),
            })?;
        debug!(source = source.as_str(), "dispatching event");
        handler(event).await
    }
}

/// An activity: JSON input in, JSON output or an [`ActivityError`] out.
pub type ActivityFn =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ActivityError>> + Send + Sync>;

/// Named activity functions the orchestrator calls through.
#[derive(Default)]
pub struct ActivityRegistry {
    activities: HashMap<&'static str, ActivityFn>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, activity: ActivityFn) {
        self.activities.insert(name, activity);
    }

    pub fn get(&self, name: &str) -> Option<&ActivityFn> {
        self.activities.get(name)
    }

    /// Check that every name in `required` is registered.
    pub fn validate(&self, required: &[&'static str]) -> Result<(), PipelineError> {
        for name in required {
            if !self.activities.contains_key(name) {
                return Err(PipelineError::UnboundActivity {
                    name: (*name).to_string(),
                });
            }
        }
        Ok(())
    }
}
