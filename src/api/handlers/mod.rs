//! REST endpoint handlers organized by resource.

pub mod poll;
pub mod request;
pub mod student;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(poll::routes())
        .merge(request::routes())
        .merge(student::routes())
}
