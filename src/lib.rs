//! # advisor-admission
//!
//! REST service for thesis-advisor polls. A teacher opens a poll with a
//! fixed number of student slots; students submit waitlist requests; the
//! teacher accepts or declines them first come, first considered.
//!
//! The service guarantees, under concurrent load, that a poll never
//! accepts more students than its capacity, that a student is accepted by
//! at most one advisor, and that filling the last slot closes the poll and
//! declines every remaining pending request in the same step.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── AdmissionService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── PollStore + StudentLedger (domain/)
//!     ├── IdentityRegistry (domain/)
//!     │
//!     └── PostgreSQL event log (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
