//! Background task that appends every journaled event to the event log.
//!
//! The recorder is the only consumer of the [`EventStream`]. Events are
//! written one at a time in stream order; a failed write is retried until it
//! succeeds, so the log never has a gap that would break replay.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::PostgresPersistence;
use crate::domain::{AdmissionEvent, EventStream};
use crate::error::AdmissionError;

/// Destination for recorded events.
pub trait EventSink: Send + Sync + 'static {
    /// Durably stores one event.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] if the write fails.
    fn record(
        &self,
        event: &AdmissionEvent,
    ) -> impl Future<Output = Result<(), AdmissionError>> + Send;
}

impl EventSink for PostgresPersistence {
    async fn record(&self, event: &AdmissionEvent) -> Result<(), AdmissionError> {
        self.save_event(event).await.map(|_| ())
    }
}

/// Backoff between attempts to write the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Spawns the recorder.
///
/// The task ends once every [`crate::domain::EventBus`] clone is dropped and
/// the backlog is written. It resolves to the number of events recorded.
pub fn spawn_event_recorder<S: EventSink>(
    mut events: EventStream,
    sink: S,
    retry: RetryPolicy,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut recorded: u64 = 0;
        while let Some(event) = events.recv().await {
            record_until_stored(&sink, &event, retry).await;
            recorded = recorded.saturating_add(1);
        }
        tracing::info!(recorded, "event recorder drained");
        recorded
    })
}

async fn record_until_stored<S: EventSink>(sink: &S, event: &AdmissionEvent, retry: RetryPolicy) {
    let mut backoff = retry.initial_backoff;
    let mut attempt: u32 = 1;
    while let Err(e) = sink.record(event).await {
        tracing::error!(
            error = %e,
            attempt,
            retry_in_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
            poll_id = %event.poll_id(),
            event_type = event.event_type_str(),
            "failed to record admission event"
        );
        tokio::time::sleep(backoff).await;
        backoff = backoff.saturating_mul(2).min(retry.max_backoff);
        attempt = attempt.saturating_add(1);
    }
}
