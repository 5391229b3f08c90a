//! The `transport` module is responsible for the realtime connection to the
//! message broker, carried over WebSockets.
//!
//! It defines the messaging protocol used between the client and the broker,
//! and implements the connection task itself: connect/reconnect handling,
//! keepalive pings, subscribe/unsubscribe commands and dispatch of incoming
//! push messages to the registry.

pub mod message;
pub mod websocket;

pub use websocket::{LinkCommand, LinkEvent, LinkHandle, LinkState, run_realtime_link};

#[cfg(test)]
mod tests;
