//! Ordered journal of committed domain events.
//!
//! Every committed admission mutation publishes an [`AdmissionEvent`] while
//! it still holds the lock that guarded the write, so the stream carries
//! events in commit order. The channel is unbounded: publishing never waits
//! and never drops, which keeps commit sections free of `.await`.
//!
//! The single consumer is the persistence recorder. A bus created with
//! [`EventBus::detached`] has no consumer and discards events; that is the
//! in-memory mode.

use tokio::sync::mpsc;

use super::AdmissionEvent;

/// Receiving end of an [`EventBus`]. Yields `None` once every bus clone is
/// dropped and the backlog is drained.
pub type EventStream = mpsc::UnboundedReceiver<AdmissionEvent>;

/// Publishing end of the event journal.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Option<mpsc::UnboundedSender<AdmissionEvent>>,
}

impl EventBus {
    /// Creates a bus together with the stream that receives its events.
    #[must_use]
    pub fn channel() -> (Self, EventStream) {
        let (sender, stream) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            stream,
        )
    }

    /// Creates a bus with no consumer.
    #[must_use]
    pub const fn detached() -> Self {
        Self { sender: None }
    }

    /// Appends an event to the journal.
    ///
    /// Returns `false` if the bus is detached or its stream was dropped.
    pub fn publish(&self, event: AdmissionEvent) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                tracing::error!(
                    poll_id = %event.poll_id(),
                    event_type = event.event_type_str(),
                    "event stream closed, event not journaled"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DeactivationReason, PollId};
    use chrono::Utc;

    fn deactivated(poll_id: PollId, reason: DeactivationReason) -> AdmissionEvent {
        AdmissionEvent::PollDeactivated {
            poll_id,
            reason,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn detached_bus_discards() {
        let bus = EventBus::detached();
        assert!(!bus.publish(deactivated(PollId::new(), DeactivationReason::TeacherClosed)));
    }

    #[tokio::test]
    async fn clones_share_one_ordered_stream() {
        let (bus, mut stream) = EventBus::channel();
        let other = bus.clone();
        let first = PollId::new();
        let second = PollId::new();

        assert!(bus.publish(deactivated(first, DeactivationReason::TeacherClosed)));
        assert!(other.publish(deactivated(second, DeactivationReason::CapacityFilled)));
        drop(bus);
        drop(other);

        let mut seen = Vec::new();
        while let Some(event) = stream.recv().await {
            seen.push(event.poll_id());
        }
        assert_eq!(seen, vec![first, second]);
    }

    #[test]
    fn publish_after_stream_dropped_fails() {
        let (bus, stream) = EventBus::channel();
        drop(stream);
        assert!(!bus.publish(deactivated(PollId::new(), DeactivationReason::TeacherClosed)));
    }
}
