//! Database models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::AdmissionEvent;
use crate::error::AdmissionError;

/// A stored row from the `admission_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID. Defines replay order.
    pub id: i64,
    /// Poll the event belongs to.
    pub poll_id: Uuid,
    /// Event type discriminator (e.g. `"request_closed"`).
    pub event_type: String,
    /// JSONB payload: the serialized event itself.
    pub payload: serde_json::Value,
    /// Server-side insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Decodes the payload back into a domain event.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::PersistenceError`] if the payload does not
    /// match any known event shape.
    pub fn decode(self) -> Result<AdmissionEvent, AdmissionError> {
        serde_json::from_value(self.payload).map_err(|e| {
            AdmissionError::PersistenceError(format!(
                "event {} ({}) is unreadable: {e}",
                self.id, self.event_type
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CathedraId, Poll, TeacherId};

    #[test]
    fn decode_reads_serialized_event() {
        let poll = Poll::new(TeacherId::new(1), CathedraId::new(2), 3, Utc::now());
        let event = AdmissionEvent::PollCreated {
            poll: poll.clone(),
            timestamp: Utc::now(),
        };
        let Ok(payload) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        let row = StoredEvent {
            id: 1,
            poll_id: *poll.id.as_uuid(),
            event_type: event.event_type_str().to_string(),
            payload,
            created_at: Utc::now(),
        };
        let Ok(decoded) = row.decode() else {
            panic!("decode failed");
        };
        assert_eq!(decoded, event);
    }

    #[test]
    fn decode_rejects_garbage() {
        let row = StoredEvent {
            id: 7,
            poll_id: Uuid::new_v4(),
            event_type: "mystery".to_string(),
            payload: serde_json::json!({"event_type": "mystery"}),
            created_at: Utc::now(),
        };
        assert!(matches!(
            row.decode(),
            Err(AdmissionError::PersistenceError(_))
        ));
    }
}
