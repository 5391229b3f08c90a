//! The `registry` module tracks who wants to hear about what.
//!
//! It maps domain identifiers (a user's challenge set, a battle pass, a
//! leaderboard) to broker topic strings, keeps one handler multicast per
//! identifier, and reference-counts subscribe/unsubscribe so that a single
//! broker subscription serves any number of listeners.

pub mod engine;
pub mod multicast;

pub use engine::{NotificationRegistry, TopicTransport};
pub use multicast::{HandlerId, MonitorId, NotificationHandler};
