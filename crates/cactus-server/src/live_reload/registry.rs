//! Registry of open live reload connections.
//!
//! Connections are added and removed by the socket tasks running on the
//! server loop, while [`ConnectionRegistry::broadcast`] is called from
//! whatever thread drives rebuilds. A single mutex serializes both sides.
//! Delivery only enqueues into each connection's bounded queue, so holding
//! the lock while broadcasting never waits on a slow browser.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::message::ReloadMessage;

/// Identifier of a live reload connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered connection: its id and the queue its socket task drains.
#[derive(Debug)]
pub(crate) struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<ReloadMessage>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, sender: mpsc::Sender<ReloadMessage>) -> Self {
        Self { id, sender }
    }
}

/// Ordered set of open live reload connections.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    connections: Mutex<Vec<Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new connection.
    pub(crate) fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a connection.
    ///
    /// Returns `false` if a connection with the same id is already registered.
    pub(crate) fn add(&self, connection: Connection) -> bool {
        let mut connections = self.lock();
        if connections.iter().any(|c| c.id == connection.id) {
            return false;
        }
        connections.push(connection);
        true
    }

    /// Unregister a connection.
    ///
    /// Returns `false` if the connection was not registered. Dropping the
    /// entry drops its sender, so the socket task's queue closes once drained.
    pub(crate) fn remove(&self, id: ConnectionId) -> bool {
        let mut connections = self.lock();
        let Some(index) = connections.iter().position(|c| c.id == id) else {
            return false;
        };
        connections.remove(index);
        true
    }

    /// Deliver a message to every registered connection in registration order.
    ///
    /// Returns the number of connections the message was queued for. A
    /// connection whose queue is full or closed is logged and skipped.
    pub(crate) fn broadcast(&self, message: ReloadMessage) -> usize {
        let connections = self.lock();
        let mut delivered = 0;

        for connection in connections.iter() {
            match connection.sender.try_send(message) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection = %connection.id, %message, "Live reload queue full, dropping message");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(connection = %connection.id, %message, "Live reload connection closed, dropping message");
                }
            }
        }

        tracing::debug!(%message, delivered, connections = connections.len(), "Broadcast reload message");
        delivered
    }

    /// Number of registered connections.
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    fn ids(&self) -> Vec<ConnectionId> {
        self.lock().iter().map(|c| c.id).collect()
    }

    /// Lock the connection list.
    ///
    /// A panic while holding the lock cannot leave the list half-updated,
    /// so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use tokio::sync::mpsc::error::TryRecvError;

    fn connect(
        registry: &ConnectionRegistry,
        capacity: usize,
    ) -> (ConnectionId, mpsc::Receiver<ReloadMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let id = registry.next_id();
        assert!(registry.add(Connection::new(id, tx)));
        (id, rx)
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, mut rx) = connect(&registry, 4);
        let (tx, _other_rx) = mpsc::channel(4);

        assert!(!registry.add(Connection::new(id, tx)));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.broadcast(ReloadMessage::Page), 1);
        assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Page);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = connect(&registry, 4);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_broadcast_in_registration_order() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = connect(&registry, 4);
        let (second, _rx2) = connect(&registry, 4);
        let (third, _rx3) = connect(&registry, 4);

        assert_eq!(registry.ids(), vec![first, second, third]);

        registry.remove(second);
        let (fourth, _rx4) = connect(&registry, 4);

        assert_eq!(registry.ids(), vec![first, third, fourth]);
    }

    #[test]
    fn test_broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new();
        let mut receivers: Vec<_> = (0..3).map(|_| connect(&registry, 4).1).collect();

        assert_eq!(registry.broadcast(ReloadMessage::Css), 3);

        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Css);
            assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        }
    }

    #[test]
    fn test_removed_connection_receives_nothing() {
        let registry = ConnectionRegistry::new();
        let (gone, mut gone_rx) = connect(&registry, 4);
        let (_kept, mut kept_rx) = connect(&registry, 4);

        registry.remove(gone);

        assert_eq!(registry.broadcast(ReloadMessage::Page), 1);
        assert_eq!(kept_rx.try_recv().unwrap(), ReloadMessage::Page);
        assert_eq!(gone_rx.try_recv().unwrap_err(), TryRecvError::Disconnected);
    }

    #[test]
    fn test_failed_delivery_does_not_stop_broadcast() {
        let registry = ConnectionRegistry::new();
        let (_closed, closed_rx) = connect(&registry, 4);
        let (_full, mut full_rx) = connect(&registry, 1);
        let (_open, mut open_rx) = connect(&registry, 4);
        drop(closed_rx);

        assert_eq!(registry.broadcast(ReloadMessage::Css), 2);
        assert_eq!(registry.broadcast(ReloadMessage::Page), 1);

        assert_eq!(full_rx.try_recv().unwrap(), ReloadMessage::Css);
        assert_eq!(full_rx.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(open_rx.try_recv().unwrap(), ReloadMessage::Css);
        assert_eq!(open_rx.try_recv().unwrap(), ReloadMessage::Page);
    }

    #[test]
    fn test_broadcast_without_connections() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.broadcast(ReloadMessage::Page), 0);
    }

    #[test]
    fn test_concurrent_add_remove_and_broadcast() {
        const ROUNDS: usize = 500;
        const BROADCASTS: usize = 2_000;

        let registry = Arc::new(ConnectionRegistry::new());
        let (_stable, mut stable_rx) = connect(&registry, BROADCASTS);

        let churn = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let (id, mut rx) = connect(&registry, BROADCASTS);
                    thread::yield_now();
                    assert!(registry.remove(id));

                    // Once removed, the sender is gone: nothing more can arrive
                    let mut received = 0;
                    loop {
                        match rx.try_recv() {
                            Ok(_) => received += 1,
                            Err(TryRecvError::Disconnected) => break,
                            Err(TryRecvError::Empty) => panic!("sender outlived removal"),
                        }
                    }
                    assert!(received <= BROADCASTS);
                }
            })
        };

        let broadcaster = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..BROADCASTS {
                    registry.broadcast(ReloadMessage::Page);
                }
            })
        };

        churn.join().unwrap();
        broadcaster.join().unwrap();

        // The stable connection saw every broadcast exactly once
        let mut received = 0;
        while stable_rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, BROADCASTS);
        assert_eq!(registry.len(), 1);
    }
}
