//! # Questline
//!
//! `questline` is a client SDK for a hosted gamification backend. It exposes
//! the backend's challenges, battle passes and leaderboards over authenticated
//! HTTP and keeps callers up to date through realtime push notifications
//! delivered over a WebSocket publish/subscribe link.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `api`: The authenticated HTTP facade exposing the backend's domain operations.
//! - `client`: The process-wide service object that owns the facade, the registry and the link.
//! - `config`: Handles loading and managing client configuration.
//! - `registry`: Tracks notification handlers per domain entity and deduplicates broker subscriptions.
//! - `transport`: Manages the WebSocket link and communication with the message broker.
//! - `utils`: Contains shared utilities, such as error handling and logging setup.

pub mod api;
pub mod client;
pub mod config;
pub mod registry;
pub mod transport;
pub mod utils;
