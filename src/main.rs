//! advisor-admission server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints, optionally
//! rebuilding state from the PostgreSQL event log first.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use advisor_admission::api;
use advisor_admission::app_state::AppState;
use advisor_admission::config::AdmissionConfig;
use advisor_admission::domain::{EventBus, PollStore, StudentLedger, TrustingRegistry};
use advisor_admission::persistence::{PostgresPersistence, RetryPolicy, spawn_event_recorder};
use advisor_admission::service::AdmissionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = AdmissionConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting advisor-admission");

    // Build domain and service layers
    let (event_bus, journal) = if config.persistence_enabled {
        let (bus, stream) = EventBus::channel();
        (bus, Some(stream))
    } else {
        (EventBus::detached(), None)
    };
    let admission_service = Arc::new(AdmissionService::new(
        Arc::new(PollStore::new()),
        Arc::new(StudentLedger::new()),
        Arc::new(TrustingRegistry),
        event_bus,
    ));

    // Rebuild state from the event log, then record new events
    let recorder = match journal {
        Some(stream) => {
            let persistence = PostgresPersistence::connect(&config).await?;
            persistence.migrate().await?;

            let events = persistence.load_events().await?;
            let replayed = events.len();
            for event in events {
                admission_service.replay(event).await?;
            }
            tracing::info!(events = replayed, "replayed event log");

            Some(spawn_event_recorder(stream, persistence, RetryPolicy::default()))
        }
        None => {
            tracing::warn!("persistence disabled, state lives in memory only");
            None
        }
    };

    // Build application state
    let app_state = AppState {
        admission_service,
        default_max_students: config.default_max_students,
    };

    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router, and with it the last bus handle, is gone; write the backlog.
    if let Some(recorder) = recorder {
        let drain = Duration::from_secs(config.shutdown_drain_secs);
        match tokio::time::timeout(drain, recorder).await {
            Ok(Ok(recorded)) => tracing::info!(recorded, "event log flushed"),
            Ok(Err(e)) => tracing::error!(error = %e, "event recorder failed"),
            Err(_) => tracing::error!(
                timeout_secs = config.shutdown_drain_secs,
                "event recorder did not drain in time"
            ),
        }
    }

    tracing::info!("advisor-admission stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
