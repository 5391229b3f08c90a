//! The `api` module is the authenticated HTTP face of the backend.
//!
//! It defines the data-transfer models exchanged with the REST endpoints,
//! implements the facade issuing the actual requests, and provides the
//! pagination cursor used for leaderboard retrieval.

pub mod facade;
pub mod models;
pub mod paging;

pub use facade::ApiFacade;
pub use paging::{DEFAULT_PAGE_SIZE, PageCursor};

#[cfg(test)]
mod tests;
