//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::AdmissionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Admission service for all business logic.
    pub admission_service: Arc<AdmissionService>,
    /// Capacity applied when `POST /polls` omits `max_students`.
    pub default_max_students: u32,
}
