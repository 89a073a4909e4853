//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`. The OpenAPI
//! document is served at `/api-docs/openapi.json`, with Swagger UI at
//! `/swagger-ui` when the `swagger-ui` feature is enabled.

pub mod dto;
pub mod extract;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "advisor-admission",
        description = "Thesis-advisor polls and capacity-aware student admission."
    ),
    paths(
        handlers::system::health_handler,
        handlers::poll::create_poll,
        handlers::poll::list_polls,
        handlers::poll::get_poll,
        handlers::poll::deactivate_poll,
        handlers::poll::list_poll_requests,
        handlers::poll::poll_occupancy,
        handlers::poll::teacher_poll,
        handlers::request::submit_request,
        handlers::request::get_request,
        handlers::request::close_request,
        handlers::student::list_student_requests,
        handlers::student::student_assignment,
    ),
    tags(
        (name = "Polls", description = "Teacher-owned polls and their waitlists"),
        (name = "Requests", description = "Student requests and teacher decisions"),
        (name = "Students", description = "Per-student views"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

/// Builds the fully layered application bound to `state`.
///
/// Requests are traced and CORS is permissive. A request running longer
/// than `request_timeout` is answered with `408 Request Timeout`.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_versioned_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/requests/{id}/close"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert_eq!(paths.len(), 12);
    }
}
