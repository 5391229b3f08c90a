//! The `error` module defines the error types surfaced by the `questline` crate.
//!
//! Every failure is local to the operation that caused it; there is no global
//! error channel. Transport disconnects are deliberately absent here: losing
//! the realtime link is not an error, the link silently reconnects and the
//! registry replays its subscriptions.

use thiserror::Error;

/// Errors surfaced by the API facade and the client service.
#[derive(Debug, Error)]
pub enum QuestlineError {
    /// Access-token generation was rejected. Fatal to the client's readiness;
    /// never retried automatically.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend answered with a non-2xx status. One-shot; the caller
    /// decides whether to retry.
    #[error("api request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response or notification body could not be decoded.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}
