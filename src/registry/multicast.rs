use std::fmt;

use serde_json::Value;
use uuid::Uuid;

/// Callback invoked with the decoded payload of every notification arriving
/// for one monitored entity.
pub type NotificationHandler = Box<dyn Fn(&Value) + Send + 'static>;

/// Opaque handle identifying one registered handler, returned by
/// `NotificationRegistry::start` and required to stop it again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one domain entity whose push notifications can be monitored:
/// a user's personal challenge set, a battle pass, or a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MonitorId {
    Challenges(String),
    BattlePass(String),
    Leaderboard(String),
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorId::Challenges(user_id) => write!(f, "user-challenges/{user_id}"),
            MonitorId::BattlePass(id) => write!(f, "battle-pass/{id}"),
            MonitorId::Leaderboard(id) => write!(f, "leaderboard/{id}"),
        }
    }
}

/// Per-entity bookkeeping: the handler multicast, the broker topic once it is
/// known, and the flags guarding the topic fetch and the live subscription.
///
/// A monitor only exists while its multicast is non-empty; the registry drops
/// the whole entry when the last handler detaches.
pub struct Monitor {
    pub(crate) handlers: Vec<(HandlerId, NotificationHandler)>,
    pub(crate) topic: Option<String>,
    pub(crate) fetch_in_flight: bool,
    pub(crate) live: bool,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Vec::new(),
            topic: None,
            fetch_in_flight: false,
            live: false,
        }
    }

    /// Append a handler to the multicast and hand back its id.
    pub(crate) fn add(&mut self, handler: NotificationHandler) -> HandlerId {
        let id = HandlerId::new();
        self.handlers.push((id.clone(), handler));
        id
    }

    /// Remove a handler from the multicast. No-op if the id is unknown.
    pub(crate) fn remove(&mut self, id: &HandlerId) -> bool {
        match self.handlers.iter().position(|(h, _)| h == id) {
            Some(pos) => {
                self.handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Invoke every handler, in registration order, once each.
    pub(crate) fn invoke(&self, payload: &Value) {
        for (_, handler) in &self.handlers {
            handler(payload);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
