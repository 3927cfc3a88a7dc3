//! Bridge configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::broadcast::DEFAULT_SEND_TIMEOUT;

/// Bridge configuration options
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the viewer (WebSocket) listener binds to
    pub viewer_addr: SocketAddr,

    /// Address the ingest (HTTP) listener binds to
    pub ingest_addr: SocketAddr,

    /// Upper bound on one viewer's send before it counts as failed
    pub send_timeout: Duration,

    /// Depth of each viewer's outbound channel
    pub outbound_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            viewer_addr: "0.0.0.0:9870".parse().unwrap(),
            ingest_addr: "0.0.0.0:9871".parse().unwrap(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            outbound_capacity: 64,
        }
    }
}

impl BridgeConfig {
    /// Set the viewer listener address
    pub fn viewer_bind(mut self, addr: SocketAddr) -> Self {
        self.viewer_addr = addr;
        self
    }

    /// Set the ingest listener address
    pub fn ingest_bind(mut self, addr: SocketAddr) -> Self {
        self.ingest_addr = addr;
        self
    }

    /// Set the per-viewer send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the per-viewer outbound channel depth
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }
}
