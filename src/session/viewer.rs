//! Viewer session lifecycle
//!
//! One session per accepted WebSocket. The session registers a handle,
//! forwards broadcast payloads from its outbound channel to the socket,
//! and drains (and ignores) anything the viewer sends back. The protocol
//! is push-only from the server's perspective.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};

use crate::registry::{ClientId, ClientRegistry, ViewerHandle};
use crate::stats::RelayStats;

/// Lifecycle state of one viewer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake complete, not yet registered
    Connecting,
    /// Registered, receiving broadcasts
    Connected,
    /// Removed from the registry; terminal, the id is never reused
    Disconnected,
}

/// One connected viewer, from registration to teardown
pub struct ViewerSession {
    id: ClientId,
    registry: Arc<ClientRegistry>,
    stats: Arc<RelayStats>,
    outbound_capacity: usize,
    state: SessionState,
}

impl ViewerSession {
    /// Create a session for a freshly-upgraded connection
    pub fn new(
        id: ClientId,
        registry: Arc<ClientRegistry>,
        stats: Arc<RelayStats>,
        outbound_capacity: usize,
    ) -> Self {
        Self {
            id,
            registry,
            stats,
            outbound_capacity,
            state: SessionState::Connecting,
        }
    }

    /// This session's client id
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the viewer goes away
    ///
    /// Exits on peer close, socket error, or the outbound channel closing
    /// (which means the broadcaster already deregistered this viewer
    /// after a failed send). Deregistration on exit is idempotent with
    /// that failure path.
    pub async fn run(mut self, mut socket: WebSocket) {
        let (handle, mut outbound) = ViewerHandle::channel(self.id, self.outbound_capacity);
        self.registry.register(handle).await;
        self.stats.record_connection();
        self.state = SessionState::Connected;

        loop {
            tokio::select! {
                payload = outbound.recv() => match payload {
                    Some(payload) => {
                        if socket.send(Message::Text(payload.to_text())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                inbound = socket.recv() => match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Viewers don't send anything meaningful
                    Some(Ok(_)) => {}
                },
            }
        }

        self.state = SessionState::Disconnected;
        self.registry.deregister(self.id).await;
        tracing::debug!(client_id = %self.id, "Viewer session closed");
    }
}
