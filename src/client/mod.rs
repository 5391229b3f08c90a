//! The `client` module provides the service object host applications hold on
//! to for the lifetime of the process.
//!
//! [`QuestlineClient`] bundles the authenticated API facade, the notification
//! registry and the realtime link behind one explicit
//! construct/inject/teardown lifecycle.

pub mod service;
pub use service::QuestlineClient;
