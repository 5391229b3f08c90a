use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::registry::multicast::{HandlerId, Monitor, MonitorId, NotificationHandler};

/// The registry's view of the realtime link.
///
/// `subscribe`/`unsubscribe` are fire-and-forget; no acknowledgement is
/// awaited. Tests substitute a recording implementation.
pub trait TopicTransport: Send {
    fn is_connected(&self) -> bool;
    fn subscribe(&self, topic: &str);
    fn unsubscribe(&self, topic: &str);
}

/// Deduplicates broker subscriptions across independent listeners.
///
/// Any number of handlers may register for the same [`MonitorId`]; the broker
/// sees at most one subscription per topic. Invariant: a broker-level
/// subscription exists if and only if the handler multicast for that
/// identifier is non-empty (modulo the window while the topic name is still
/// being fetched).
///
/// The registry is not designed for concurrent mutation. It lives behind one
/// `Mutex`, and everything the transport's I/O task delivers is marshaled
/// into calls made under that lock.
pub struct NotificationRegistry {
    transport: Box<dyn TopicTransport>,
    monitors: HashMap<MonitorId, Monitor>,
}

impl NotificationRegistry {
    pub fn new(transport: Box<dyn TopicTransport>) -> Self {
        Self {
            transport,
            monitors: HashMap::new(),
        }
    }

    /// Register a handler for `id`.
    ///
    /// Returns the handler's id and whether the caller must fetch the broker
    /// topic for this monitor (true only for the first registration while no
    /// fetch is already in flight, so concurrent starts cannot issue
    /// duplicate lookups). If the topic is already known but the broker
    /// subscription lapsed, it is re-established here.
    pub fn start(&mut self, id: MonitorId, handler: NotificationHandler) -> (HandlerId, bool) {
        let monitor = self.monitors.entry(id.clone()).or_insert_with(Monitor::new);
        let handler_id = monitor.add(handler);

        let needs_fetch = if let Some(topic) = &monitor.topic {
            if !monitor.live && self.transport.is_connected() {
                self.transport.subscribe(topic);
                monitor.live = true;
            }
            false
        } else if monitor.fetch_in_flight {
            false
        } else {
            monitor.fetch_in_flight = true;
            true
        };

        debug!(monitor = %id, handlers = monitor.handlers.len(), needs_fetch, "handler registered");
        (handler_id, needs_fetch)
    }

    /// Remove a handler from `id`'s multicast.
    ///
    /// When the multicast empties, the broker subscription is dropped and the
    /// topic mapping discarded. Returns false if the handler was not
    /// registered.
    pub fn stop(&mut self, id: &MonitorId, handler_id: &HandlerId) -> bool {
        let Some(monitor) = self.monitors.get_mut(id) else {
            return false;
        };
        let removed = monitor.remove(handler_id);
        if removed && monitor.is_empty() {
            if monitor.live {
                if let Some(topic) = &monitor.topic {
                    self.transport.unsubscribe(topic);
                }
            }
            self.monitors.remove(id);
            debug!(monitor = %id, "last handler detached, mapping discarded");
        }
        removed
    }

    /// Record the broker topic resolved for `id` and subscribe if the link is
    /// up. A resolution arriving after every handler already detached is
    /// discarded so no orphan subscription survives.
    pub fn complete_topic_fetch(&mut self, id: &MonitorId, topic: String) {
        let Some(monitor) = self.monitors.get_mut(id) else {
            debug!(monitor = %id, "topic resolved after all handlers detached, discarding");
            return;
        };
        monitor.fetch_in_flight = false;
        monitor.topic = Some(topic);
        if !monitor.live && self.transport.is_connected() {
            if let Some(topic) = &monitor.topic {
                self.transport.subscribe(topic);
                monitor.live = true;
            }
        }
    }

    /// Clear the fetch-in-flight guard after a failed topic lookup. The
    /// handlers stay registered but inert; the next link establishment
    /// triggers another lookup.
    pub fn abort_topic_fetch(&mut self, id: &MonitorId) {
        if let Some(monitor) = self.monitors.get_mut(id) {
            monitor.fetch_in_flight = false;
        }
    }

    /// Replay state onto a freshly established link.
    ///
    /// Subscribes every known topic with a non-empty multicast exactly once,
    /// and returns the identifiers that still need a topic lookup (first
    /// lookup never completed, or a previous one failed).
    pub fn on_link_connected(&mut self) -> Vec<MonitorId> {
        let mut pending = Vec::new();
        for (id, monitor) in &mut self.monitors {
            if monitor.is_empty() {
                continue;
            }
            match &monitor.topic {
                Some(topic) => {
                    if !monitor.live {
                        self.transport.subscribe(topic);
                        monitor.live = true;
                    }
                }
                None => {
                    if !monitor.fetch_in_flight {
                        monitor.fetch_in_flight = true;
                        pending.push(id.clone());
                    }
                }
            }
        }
        pending
    }

    /// The link dropped: every broker subscription is gone with it.
    pub fn on_link_disconnected(&mut self) {
        for monitor in self.monitors.values_mut() {
            monitor.live = false;
        }
    }

    /// Deliver a broker message to every handler registered for the monitor
    /// mapped to `topic`. Returns the number of handlers invoked.
    pub fn dispatch(&self, topic: &str, payload: &Value) -> usize {
        let mut delivered = 0;
        for monitor in self.monitors.values() {
            if monitor.topic.as_deref() == Some(topic) {
                monitor.invoke(payload);
                delivered += monitor.handlers.len();
            }
        }
        delivered
    }

    /// Teardown: detach all handlers and drop every live subscription.
    pub fn clear(&mut self) {
        for monitor in self.monitors.values() {
            if monitor.live {
                if let Some(topic) = &monitor.topic {
                    self.transport.unsubscribe(topic);
                }
            }
        }
        self.monitors.clear();
    }

    /// Number of handlers currently registered for `id`.
    pub fn handler_count(&self, id: &MonitorId) -> usize {
        self.monitors.get(id).map_or(0, |m| m.handlers.len())
    }

    /// Whether a broker subscription is currently active for `id`.
    pub fn is_live(&self, id: &MonitorId) -> bool {
        self.monitors.get(id).is_some_and(|m| m.live)
    }

    /// The topic mapped to `id`, if the lookup completed.
    pub fn topic(&self, id: &MonitorId) -> Option<&str> {
        self.monitors.get(id).and_then(|m| m.topic.as_deref())
    }
}
