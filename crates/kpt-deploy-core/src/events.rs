//! Deploy events for conditions that do not abort the operation.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployEvent {
    pub level: EventLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl DeployEvent {
    pub fn info(message: impl fmt::Display) -> Self {
        Self::new(EventLevel::Info, message)
    }

    pub fn warning(message: impl fmt::Display) -> Self {
        Self::new(EventLevel::Warning, message)
    }

    fn new(level: EventLevel, message: impl fmt::Display) -> Self {
        Self {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives deploy events.
pub trait EventSink {
    fn emit(&self, event: DeployEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DeployEvent) {
        match event.level {
            EventLevel::Info => tracing::info!(target: "kpt_deploy::events", "{}", event.message),
            EventLevel::Warning => {
                tracing::warn!(target: "kpt_deploy::events", "{}", event.message)
            }
        }
    }
}

/// Keeps events in memory and logs them.
///
/// Clones share the same buffer, so a caller can keep one handle and give
/// another to a `Deployer`.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn of_level(&self, level: EventLevel) -> Vec<DeployEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: DeployEvent) {
        TracingEventSink.emit(event.clone());
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
