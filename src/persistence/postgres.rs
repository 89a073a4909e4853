//! PostgreSQL implementation of the event log.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::StoredEvent;
use crate::config::AdmissionConfig;
use crate::domain::AdmissionEvent;
use crate::error::AdmissionError;

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] if the database is
    /// unreachable within the connect timeout.
    pub async fn connect(config: &AdmissionConfig) -> Result<Self, AdmissionError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "database pool ready"
        );
        Ok(Self::new(pool))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), AdmissionError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AdmissionError::PersistenceError(e.to_string()))
    }

    /// Appends an event to the log and returns its row ID.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] on serialization or
    /// database failure.
    pub async fn save_event(&self, event: &AdmissionEvent) -> Result<i64, AdmissionError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| AdmissionError::PersistenceError(e.to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO admission_events (poll_id, event_type, payload) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(*event.poll_id().as_uuid())
        .bind(event.event_type_str())
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Loads every stored row in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] on database failure.
    pub async fn load_rows(&self) -> Result<Vec<StoredEvent>, AdmissionError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, poll_id, event_type, payload, created_at \
             FROM admission_events ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, poll_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    poll_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Loads and decodes every stored event in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] on database failure or
    /// when a stored payload cannot be decoded.
    pub async fn load_events(&self) -> Result<Vec<AdmissionEvent>, AdmissionError> {
        self.load_rows()
            .await?
            .into_iter()
            .map(StoredEvent::decode)
            .collect()
    }
}
