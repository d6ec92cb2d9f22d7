use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::structs::event::{LiveEvent, LiveEventKind};

/// Receives every event of the kind it was subscribed to, in emission order
pub type Handler = UnboundedSender<LiveEvent>;

type Handlers = HashMap<LiveEventKind, Vec<(u64, Handler)>>;

/// Local handlers of a live channel, grouped by event kind.
///
/// Registrations are independent of the socket: a reconnect keeps them.
#[derive(Clone, Default)]
pub struct EventRegistry {
    handlers: Arc<RwLock<Handlers>>,
    next_id: Arc<AtomicU64>,
}

impl EventRegistry {
    pub fn subscribe(&self, event_type: LiveEventKind, handler: Handler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type)
            .or_default()
            .push((id, handler));

        Subscription {
            registry: self.clone(),
            event_type,
            id,
            active: true,
        }
    }

    fn unsubscribe(&self, event_type: LiveEventKind, id: u64) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Entry::Occupied(mut entry) = handlers.entry(event_type) else {
            return false;
        };
        let registrations = entry.get_mut();
        let len = registrations.len();
        registrations.retain(|(registered, _)| *registered != id);
        let removed = registrations.len() < len;
        if registrations.is_empty() {
            entry.remove_entry();
        }
        removed
    }

    /// Hands `event` to every handler of its kind, returns how many took it
    pub fn dispatch(&self, event: LiveEvent) -> usize {
        let event_type = event.kind();
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = handlers.get(&event_type) else {
            debug!("No handler for {event_type:?} on post {}", event.post_id());
            return 0;
        };

        registrations
            .iter()
            .filter(|(_, handler)| handler.send(event.clone()).is_ok())
            .count()
    }

    pub fn handler_count(&self, event_type: LiveEventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .map_or(0, |registrations| registrations.len())
    }
}

/// A registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    registry: EventRegistry,
    event_type: LiveEventKind,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn event_type(&self) -> LiveEventKind {
        self.event_type
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if !self.registry.unsubscribe(self.event_type, self.id) {
            warn!("Handler {} was not subscribed to {:?}", self.id, self.event_type);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
