//! Best-effort broadcast of collection changes to in-process listeners.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{panic_message, RuntimeError};
use crate::report::ErrorReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    Created,
    Read,
    Updated,
    Deleted,
}

impl EventChannel {
    pub fn name(self) -> &'static str {
        match self {
            EventChannel::Created => "created",
            EventChannel::Read => "read",
            EventChannel::Updated => "updated",
            EventChannel::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle returned by [`EventNotifier::on`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Per-channel listener registry. Clones share the same listeners.
pub struct EventNotifier<T> {
    listeners: Arc<RwLock<HashMap<EventChannel, Vec<(ListenerId, Listener<T>)>>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for EventNotifier<T> {
    fn clone(&self) -> Self {
        EventNotifier {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for EventNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventNotifier<T> {
    pub fn new() -> Self {
        EventNotifier {
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn on<F>(&self, channel: EventChannel, listener: F) -> ListenerId
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(channel)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false when no listener had this id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for channel_listeners in listeners.values_mut() {
            let before = channel_listeners.len();
            channel_listeners.retain(|(listener_id, _)| *listener_id != id);
            removed |= channel_listeners.len() != before;
        }
        removed
    }

    pub fn listener_count(&self, channel: EventChannel) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners.get(&channel).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, channel: EventChannel) -> bool {
        self.listener_count(channel) > 0
    }

    /// Calls every listener of `channel` with `items`.
    ///
    /// Does nothing when the channel is unobserved or `items` is empty.
    /// A panicking listener is reported and does not stop the others.
    pub fn emit(&self, channel: EventChannel, items: &[T], reporter: &dyn ErrorReporter) {
        if items.is_empty() {
            return;
        }
        let targets: Vec<Listener<T>> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            match listeners.get(&channel) {
                Some(channel_listeners) if !channel_listeners.is_empty() => channel_listeners
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect(),
                _ => return,
            }
        };

        for listener in targets {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(items))) {
                reporter.report(&RuntimeError::ListenerPanicked {
                    channel: channel.name(),
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }
}
