//! In-process event bus for live log/alert notifications
//!
//! Events are fanned out to whoever is subscribed at publish time and are
//! never buffered for absent observers. Each observer gets its own
//! unbounded channel, so delivery order per observer matches publish
//! order; a subscription created after a publish never sees that event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;

/// Event category, mirrored to the dashboard's log pane vs. alert list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Log,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Error,
}

/// One ephemeral notification; constructed, published once, discarded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    pub level: EventLevel,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

impl Event {
    pub fn log(level: EventLevel, message: impl Into<String>) -> Self {
        Self::new(EventKind::Log, level, message)
    }

    pub fn alert(level: EventLevel, message: impl Into<String>) -> Self {
        Self::new(EventKind::Alert, level, message)
    }

    fn new(kind: EventKind, level: EventLevel, message: impl Into<String>) -> Self {
        Event {
            kind,
            message: message.into(),
            level,
            timestamp: Utc::now().to_rfc3339(),
            device_id: None,
            device_name: None,
        }
    }

    /// Tags the event with the device it concerns
    pub fn with_device(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self.device_name = Some(name.into());
        self
    }
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    observers: HashMap<u64, mpsc::UnboundedSender<Event>>,
}

/// Publish/subscribe hub; cheap to clone, all clones share one observer set
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer; it receives only events published from now on
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.insert(id, tx);
            id
        };
        tracing::debug!("Event observer {} subscribed", id);
        Subscription {
            id,
            rx,
            bus: self.clone(),
        }
    }

    /// Delivers the event to every observer registered right now
    ///
    /// Observers whose receiving side is gone are dropped silently; the
    /// publisher never sees an error.
    pub fn publish(&self, event: Event) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .observers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    /// Number of currently registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.lock().unwrap().observers.len()
    }

    fn unsubscribe(&self, id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if inner.observers.remove(&id).is_some() {
            tracing::debug!("Event observer {} unsubscribed", id);
        }
    }
}

/// An observer's receiving end; dropping it unsubscribes
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Event>,
    bus: EventBus,
}

impl Subscription {
    /// Waits for the next event; `None` once the bus side is gone
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking receive, mainly for draining in tests
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
