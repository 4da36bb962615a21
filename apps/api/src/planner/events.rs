//! Best-effort planning event log.
//!
//! Served plans emit a [`PlanningEvent`] into a bounded channel; a background
//! task drains the channel into a Redis stream for analytics. The log is off
//! the critical path: a full buffer drops the event and a failed stream write
//! only logs.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events buffered before the analytics writer drops them.
pub const EVENT_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct PlanningEvent {
    pub user: String,
    pub city: String,
    pub country: String,
    /// RFC3339.
    pub timestamp: String,
}

/// Cheap-to-clone sending half handed to request handlers.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<PlanningEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::Receiver<PlanningEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        (Self { tx }, rx)
    }

    /// Never blocks a request; a full buffer silently sheds the event.
    pub fn record(&self, event: PlanningEvent) {
        if self.tx.try_send(event).is_err() {
            debug!("planning event buffer full; event dropped");
        }
    }
}

/// Drains planning events into the configured Redis stream.
pub fn spawn_event_writer(
    conn: ConnectionManager,
    stream_name: String,
    mut rx: mpsc::Receiver<PlanningEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut conn = conn.clone();
            let fields = [
                ("user", event.user.as_str()),
                ("city", event.city.as_str()),
                ("country", event.country.as_str()),
                ("timestamp", event.timestamp.as_str()),
            ];
            let appended: Result<String, redis::RedisError> =
                conn.xadd(&stream_name, "*", &fields).await;
            if let Err(err) = appended {
                warn!(error = %err, "planning event stream write failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_flow_through_channel() {
        let (sink, mut rx) = EventSink::channel();
        sink.record(PlanningEvent {
            user: "guest".to_string(),
            city: "san diego".to_string(),
            country: "usa".to_string(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.city, "san diego");
    }

    #[tokio::test]
    async fn test_full_buffer_drops_silently() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = EventSink { tx };
        let event = PlanningEvent {
            user: "guest".to_string(),
            city: "a".to_string(),
            country: "b".to_string(),
            timestamp: String::new(),
        };
        sink.record(event.clone());
        // buffer of one is now full; the second record must not panic or block
        sink.record(event);
    }
}
