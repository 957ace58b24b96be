//! # Notification Hub
//!
//! Process-wide registry of open admin live-update connections. Intake
//! broadcasts a `new_contact` event after every successful submission;
//! delivery is best-effort and at-most-once per connection, with per-client
//! send failures swallowed so one dead stream never blocks the rest.

use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde_json::json;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Events pushed to connected admin dashboards.
#[derive(Debug, Clone)]
pub enum AdminEvent {
    Connected,
    NewContact { timestamp: DateTime<Utc> },
}

impl AdminEvent {
    /// Renders the event as one SSE frame.
    fn to_frame(&self) -> Bytes {
        let payload = match self {
            AdminEvent::Connected => json!({ "type": "connected" }),
            AdminEvent::NewContact { timestamp } => {
                json!({ "type": "new_contact", "timestamp": timestamp })
            }
        };
        Bytes::from(format!("data: {payload}\n\n"))
    }
}

pub struct NotificationHub {
    clients: Mutex<HashMap<u64, UnboundedSender<Bytes>>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Adds a connection and immediately queues the `connected` ack.
    pub fn register(&self) -> (u64, UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive at this point, the ack cannot fail.
        let _ = tx.send(AdminEvent::Connected.to_frame());

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients
            .lock()
            .expect("notification hub lock poisoned")
            .insert(id, tx);
        log::debug!("admin stream {id} connected");
        (id, rx)
    }

    pub fn unregister(&self, id: u64) {
        self.clients
            .lock()
            .expect("notification hub lock poisoned")
            .remove(&id);
        log::debug!("admin stream {id} disconnected");
    }

    /// Sends the event to every registered connection. Failed sends are
    /// logged and swallowed; the caller never sees them.
    pub fn broadcast(&self, event: &AdminEvent) {
        let frame = event.to_frame();
        let clients = self.clients.lock().expect("notification hub lock poisoned");
        for (id, tx) in clients.iter() {
            if tx.send(frame.clone()).is_err() {
                log::debug!("admin stream {id} went away mid-broadcast");
            }
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients
            .lock()
            .expect("notification hub lock poisoned")
            .len()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Long-lived SSE response body. Dropping it (client disconnect) is the one
/// cleanup duty: removal from the hub's registry.
pub struct EventStream {
    hub: Arc<NotificationHub>,
    id: u64,
    rx: UnboundedReceiver<Bytes>,
}

impl EventStream {
    pub fn subscribe(hub: Arc<NotificationHub>) -> Self {
        let (id, rx) = hub.register();
        Self { hub, id, rx }
    }
}

impl Stream for EventStream {
    type Item = Result<Bytes, actix_web::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_str(frame: &Bytes) -> &str {
        std::str::from_utf8(frame).unwrap()
    }

    #[tokio::test]
    async fn test_register_sends_connected_ack() {
        let hub = NotificationHub::new();
        let (_id, mut rx) = hub.register();
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame_str(&frame), "data: {\"type\":\"connected\"}\n\n");
        assert_eq!(hub.client_count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        let hub = NotificationHub::new();
        let (_a, mut rx_a) = hub.register();
        let (_b, mut rx_b) = hub.register();
        rx_a.recv().await.unwrap(); // drain acks
        rx_b.recv().await.unwrap();

        hub.broadcast(&AdminEvent::NewContact { timestamp: Utc::now() });

        for rx in [&mut rx_a, &mut rx_b] {
            let frame = rx.recv().await.unwrap();
            assert!(frame_str(&frame).contains("\"type\":\"new_contact\""));
            assert!(frame_str(&frame).contains("timestamp"));
        }
    }

    #[tokio::test]
    async fn test_dead_client_does_not_block_broadcast() {
        let hub = NotificationHub::new();
        let (_dead, rx_dead) = hub.register();
        drop(rx_dead);
        let (_live, mut rx_live) = hub.register();
        rx_live.recv().await.unwrap();

        // Must not panic or error even though one send fails.
        hub.broadcast(&AdminEvent::NewContact { timestamp: Utc::now() });
        let frame = rx_live.recv().await.unwrap();
        assert!(frame_str(&frame).contains("new_contact"));
    }

    #[tokio::test]
    async fn test_unregister_removes_client() {
        let hub = Arc::new(NotificationHub::new());
        let stream = EventStream::subscribe(hub.clone());
        assert_eq!(hub.client_count(), 1);
        drop(stream);
        assert_eq!(hub.client_count(), 0);
    }
}
