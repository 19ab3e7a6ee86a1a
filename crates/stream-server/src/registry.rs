//! Connected-client registry.
//!
//! Each client owns a bounded outbound queue. Fan-out never waits: a client
//! whose queue is full or whose writer has gone away is removed on the spot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

pub type ClientId = u64;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Clients of one server lifetime, keyed by connection id.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, mpsc::Sender<Message>>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl ClientRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a client and hand back the receiving end of its queue.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<Message>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.clients().insert(id, tx);
        (id, rx)
    }

    /// Remove a client. Its queue closes once the registry's sender drops.
    pub fn unregister(&self, id: ClientId) -> bool {
        self.clients().remove(&id).is_some()
    }

    /// Queue a message for one client, dropping the client if it cannot
    /// take it.
    pub fn send_to(&self, id: ClientId, message: Message) -> bool {
        let mut clients = self.clients();
        let Some(tx) = clients.get(&id) else {
            return false;
        };
        match tx.try_send(message) {
            Ok(()) => true,
            Err(err) => {
                log_drop(id, &err);
                clients.remove(&id);
                false
            }
        }
    }

    /// Offer a text frame to every client.
    pub fn broadcast(&self, text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        self.clients()
            .retain(|id, tx| match tx.try_send(Message::Text(text.to_owned())) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(err) => {
                    log_drop(*id, &err);
                    report.dropped += 1;
                    false
                }
            });
        report
    }

    /// Send a close frame to every client and forget them all.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.clients().drain().collect();
        for (_, tx) in &drained {
            let _ = tx.try_send(Message::Close(None));
        }
        if !drained.is_empty() {
            tracing::info!(clients = drained.len(), "Closed all clients");
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<_> = self.clients().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, mpsc::Sender<Message>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_drop<T>(id: ClientId, err: &TrySendError<T>) {
    match err {
        TrySendError::Full(_) => tracing::warn!(client = id, "Client too slow, dropping"),
        TrySendError::Closed(_) => tracing::debug!(client = id, "Client gone, dropping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let registry = ClientRegistry::new(4);
        let (a, _rx_a) = registry.register();
        let (b, _rx_b) = registry.register();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec![a, b]);

        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_broadcast_drops_slow_and_dead_clients() {
        let registry = ClientRegistry::new(1);
        let (healthy, mut healthy_rx) = registry.register();
        let (_slow, _slow_rx) = registry.register();
        let (_dead, dead_rx) = registry.register();
        drop(dead_rx);

        // Fill the slow client's single slot and drain the healthy one.
        let first = registry.broadcast("one");
        assert_eq!(first.delivered, 2);
        assert_eq!(first.dropped, 1);
        assert_eq!(healthy_rx.try_recv().ok(), Some(Message::Text("one".into())));

        let second = registry.broadcast("two");
        assert_eq!(second, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(registry.ids(), vec![healthy]);
        assert_eq!(healthy_rx.try_recv().ok(), Some(Message::Text("two".into())));
    }

    #[test]
    fn test_send_to_unknown_client() {
        let registry = ClientRegistry::new(2);
        assert!(!registry.send_to(42, Message::Text("x".into())));
    }

    #[test]
    fn test_close_all_sends_close_and_clears() {
        let registry = ClientRegistry::new(2);
        let (_a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        assert_eq!(registry.close_all(), 2);
        assert!(registry.is_empty());
        assert_eq!(rx_a.try_recv().ok(), Some(Message::Close(None)));
        assert_eq!(rx_b.try_recv().ok(), Some(Message::Close(None)));
        // Senders are gone, so the queues report closed after draining.
        assert!(rx_a.try_recv().is_err());
    }
}
