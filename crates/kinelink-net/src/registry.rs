//! Client registry: the set of live connections
//!
//! Handlers register on accept and unregister on disconnect. Broadcast
//! takes a point-in-time copy under the lock and sends outside it,
//! best-effort; one dead client never aborts delivery to the rest.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

pub type ClientId = u64;

/// Handle to one connected client's outbound queue
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ClientId,
    pub addr: SocketAddr,
    sender: mpsc::UnboundedSender<String>,
}

impl ClientHandle {
    /// Queue a line for this client; false when the writer is gone
    pub fn send(&self, line: String) -> bool {
        self.sender.send(line).is_ok()
    }
}

/// Thread-safe set of active connections
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientHandle>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry::default()
    }

    pub fn register(&self, addr: SocketAddr, sender: mpsc::UnboundedSender<String>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ClientHandle { id, addr, sender };
        self.clients.lock().insert(id, handle);
        id
    }

    pub fn unregister(&self, id: ClientId) -> bool {
        self.clients.lock().remove(&id).is_some()
    }

    /// Point-in-time copy of the registered clients
    pub fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.lock().values().cloned().collect()
    }

    /// Best-effort send to every client; returns the delivered count
    pub fn broadcast(&self, line: &str) -> usize {
        let clients = self.snapshot();
        let mut delivered = 0;
        for client in clients {
            if client.send(line.to_string()) {
                delivered += 1;
            } else {
                tracing::debug!(id = client.id, addr = %client.addr, "broadcast skipped dead client");
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Drop every registered handle, closing the outbound queues
    pub fn clear(&self) {
        self.clients.lock().clear();
    }
}
