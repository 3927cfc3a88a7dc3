//! Viewer (WebSocket) listener
//!
//! Accepts viewer connections and hands each upgraded socket to a
//! [`ViewerSession`]. Client ids are allocated from a process-wide
//! counter, one incrementing integer per accepted connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::registry::{ClientId, ClientRegistry};
use crate::session::ViewerSession;
use crate::stats::RelayStats;

/// Shared state for the viewer listener
#[derive(Clone)]
pub struct ViewerState {
    registry: Arc<ClientRegistry>,
    stats: Arc<RelayStats>,
    outbound_capacity: usize,
    next_client_id: Arc<AtomicU64>,
}

impl ViewerState {
    /// Create listener state over the shared registry
    pub fn new(
        registry: Arc<ClientRegistry>,
        stats: Arc<RelayStats>,
        outbound_capacity: usize,
    ) -> Self {
        Self {
            registry,
            stats,
            outbound_capacity,
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_client_id(&self) -> ClientId {
        ClientId::new(self.next_client_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Build the viewer router: a single upgrade route
pub fn router(state: ViewerState) -> Router {
    Router::new().route("/", get(upgrade)).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<ViewerState>) -> Response {
    let id = state.next_client_id();
    let session = ViewerSession::new(
        id,
        Arc::clone(&state.registry),
        Arc::clone(&state.stats),
        state.outbound_capacity,
    );

    tracing::debug!(client_id = %id, "Viewer connection upgrading");
    ws.on_upgrade(move |socket| session.run(socket))
}
