//! Service layer: business logic orchestration.
//!
//! [`AdmissionService`] runs the poll/request state machine against the
//! domain stores, consults the identity registry, and emits events through
//! the [`super::domain::EventBus`]. Read-only projections live in
//! [`query_service`].

pub mod admission_service;
pub mod query_service;

pub use admission_service::{AdmissionService, CascadedRequest, CloseOutcome, apply_close};
