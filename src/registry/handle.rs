//! Viewer handle types
//!
//! A [`ViewerHandle`] is the registry's view of one connected viewer: an
//! id for logging plus the sending half of that viewer's outbound
//! channel. The receiving half lives in the viewer's session task, which
//! forwards payloads to the socket. Handles are cheap to clone, so the
//! registry can hand out point-in-time snapshots without holding a lock
//! while the broadcaster sends.

use tokio::sync::mpsc;

use crate::broadcast::WireMessage;

use super::error::RegistryError;

/// Unique identifier for a connected viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    /// Create a client id from a raw counter value
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Send-capable reference to one connected viewer
///
/// Membership in the [`ClientRegistry`](super::ClientRegistry) is the only
/// state tracked per viewer. No per-viewer backlog or acknowledgment state
/// exists; a send either lands in the session's outbound channel or fails.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    id: ClientId,
    tx: mpsc::Sender<WireMessage>,
}

impl ViewerHandle {
    /// Create a handle and the outbound receiver for its session task
    pub fn channel(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<WireMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, rx)
    }

    /// This viewer's id
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Queue a payload for delivery to this viewer
    ///
    /// Fails once the session task has dropped the receiving half, i.e.
    /// the viewer is gone.
    pub async fn send(&self, payload: WireMessage) -> Result<(), RegistryError> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| RegistryError::ViewerGone(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let (handle, mut rx) = ViewerHandle::channel(ClientId::new(1), 4);

        let payload = WireMessage::json(&serde_json::json!({"t": 0.0})).unwrap();
        handle.send(payload.clone()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.as_bytes(), payload.as_bytes());
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (handle, rx) = ViewerHandle::channel(ClientId::new(2), 4);
        drop(rx);

        let payload = WireMessage::json(&serde_json::json!({"t": 0.0})).unwrap();
        let err = handle.send(payload).await.unwrap_err();
        assert!(matches!(err, RegistryError::ViewerGone(id) if id == ClientId::new(2)));
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId::new(42).to_string(), "42");
    }
}
