//! Client registry implementation
//!
//! The shared set of connected viewers. Mutated by the connect/disconnect
//! path and by the broadcaster when a send fails; read (snapshotted) once
//! per frame tick.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::handle::{ClientId, ViewerHandle};

/// Registry of currently-connected viewers
///
/// Thread-safe via `RwLock`. The broadcast path is read-heavy: one
/// `snapshot()` per frame tick against occasional register/deregister
/// writes. The lock is released before any caller awaits a send, so a
/// stalled viewer can never block registry mutation.
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, ViewerHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Add a viewer
    ///
    /// Idempotent: registering the same id again replaces the stored
    /// handle and changes nothing observable.
    pub async fn register(&self, handle: ViewerHandle) {
        let id = handle.id();
        let total = {
            let mut clients = self.clients.write().await;
            clients.insert(id, handle);
            clients.len()
        };

        tracing::info!(client_id = %id, total = total, "Viewer registered");
    }

    /// Remove a viewer if present
    ///
    /// A no-op for unknown ids, which covers the race where a viewer
    /// disconnects while a broadcast against an older snapshot is still
    /// in flight.
    pub async fn deregister(&self, id: ClientId) {
        let (was_present, total) = {
            let mut clients = self.clients.write().await;
            (clients.remove(&id).is_some(), clients.len())
        };

        if was_present {
            tracing::info!(client_id = %id, total = total, "Viewer deregistered");
        }
    }

    /// Point-in-time copy of the current viewer set
    ///
    /// Mutations after the call do not affect the returned handles, so
    /// the broadcaster can iterate without holding the lock.
    pub async fn snapshot(&self) -> Vec<ViewerHandle> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Number of currently-connected viewers
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
