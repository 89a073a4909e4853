//! Persistence layer: PostgreSQL event log.
//!
//! Every committed [`crate::domain::AdmissionEvent`] is appended to the
//! `admission_events` table by a background recorder that drains the
//! event journal. At startup the log is replayed in insertion order to rebuild
//! the in-memory stores.

pub mod models;
pub mod postgres;
pub mod recorder;

pub use postgres::PostgresPersistence;
pub use recorder::{EventSink, RetryPolicy, spawn_event_recorder};
