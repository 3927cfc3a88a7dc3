//! Registry error types
//!
//! Per-viewer delivery failures. These are absorbed by the broadcast loop
//! (logged, then the viewer is deregistered) and never escalate.

use super::handle::ClientId;

/// Error type for per-viewer delivery
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// The viewer's outbound channel is closed (session ended)
    ViewerGone(ClientId),
    /// The viewer did not accept the payload within the send timeout
    SendTimeout(ClientId),
}

impl RegistryError {
    /// The viewer this failure belongs to
    pub fn client_id(&self) -> ClientId {
        match self {
            RegistryError::ViewerGone(id) | RegistryError::SendTimeout(id) => *id,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::ViewerGone(id) => write!(f, "Viewer gone: {}", id),
            RegistryError::SendTimeout(id) => write!(f, "Send timed out for viewer: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}
