//! The sessionstore crate keeps opaque session payloads under caller-supplied tokens until they expire.
//!
//! [`SessionStore`] is the public entry point: it finds unexpired sessions, commits them with
//! insert-or-replace semantics and deletes them on demand. A background cleanup task, started
//! explicitly with [`SessionStore::start_cleanup`], periodically sweeps expired records from the
//! [`SessionBackend`] so storage does not grow unbounded.

/// The storage seam the store delegates persistence to.
pub mod backend;
mod cleanup;
mod error;
mod store;

#[cfg(test)]
mod testing;

pub use backend::{SessionBackend, SqliteBackend};
pub use error::{Error, Result};
pub use store::{Clock, DEFAULT_CLEANUP_INTERVAL_SECS, SessionStore};
