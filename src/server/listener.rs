//! Bridge server
//!
//! Owns the shared registry, stats, and broadcaster, and serves the two
//! listeners: viewer WebSocket connections on one port, producer ingest
//! on the other. The listeners share nothing but the in-process state.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::broadcast::FrameBroadcaster;
use crate::error::Result;
use crate::registry::ClientRegistry;
use crate::server::config::BridgeConfig;
use crate::server::ingest::{self, IngestState};
use crate::server::viewer::{self, ViewerState};
use crate::stats::RelayStats;

/// The frame bridge: one registry, one broadcaster, two listeners
pub struct BridgeServer {
    config: BridgeConfig,
    registry: Arc<ClientRegistry>,
    stats: Arc<RelayStats>,
    broadcaster: FrameBroadcaster,
}

impl BridgeServer {
    /// Create a bridge with the given configuration
    pub fn new(config: BridgeConfig) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let broadcaster = FrameBroadcaster::new(Arc::clone(&registry), Arc::clone(&stats))
            .with_send_timeout(config.send_timeout);

        Self {
            config,
            registry,
            stats,
            broadcaster,
        }
    }

    /// The shared viewer registry
    ///
    /// Exposed so a harness can drive the engine without sockets.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// The broadcaster fed by the ingest endpoint
    pub fn broadcaster(&self) -> &FrameBroadcaster {
        &self.broadcaster
    }

    /// The configuration this bridge was built with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Run the bridge
    ///
    /// This method blocks until a listener fails.
    pub async fn run(&self) -> Result<()> {
        let (viewer_listener, ingest_listener) = self.bind().await?;
        self.serve(viewer_listener, ingest_listener).await
    }

    /// Run the bridge with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let (viewer_listener, ingest_listener) = self.bind().await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(viewer_listener, ingest_listener) => result,
        }
    }

    async fn bind(&self) -> Result<(TcpListener, TcpListener)> {
        let viewer_listener = TcpListener::bind(self.config.viewer_addr).await?;
        let ingest_listener = TcpListener::bind(self.config.ingest_addr).await?;

        tracing::info!(
            viewer = %self.config.viewer_addr,
            ingest = %self.config.ingest_addr,
            "Bridge listening"
        );

        Ok((viewer_listener, ingest_listener))
    }

    async fn serve(&self, viewer_listener: TcpListener, ingest_listener: TcpListener) -> Result<()> {
        let viewer_app = viewer::router(ViewerState::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
            self.config.outbound_capacity,
        ));
        let ingest_app = ingest::router(IngestState {
            broadcaster: self.broadcaster.clone(),
            stats: Arc::clone(&self.stats),
        });

        tokio::try_join!(
            async move { axum::serve(viewer_listener, viewer_app).await },
            async move { axum::serve(ingest_listener, ingest_app).await },
        )?;

        Ok(())
    }
}
