//! Real-time animation frame broadcast server
//!
//! An external process captures animation parameter frames and posts them
//! here in batches; this crate replays each batch to every connected
//! WebSocket viewer at the batch's target frame rate.
//!
//! # Architecture
//!
//! ```text
//!  producer ──POST /frames──► [Ingest]───spawn───► [FrameBroadcaster]
//!                                                      │ pace 1/fps
//!                                                      ▼
//!                                              ClientRegistry.snapshot()
//!                                                      │ fan-out
//!                                       ┌──────────────┼──────────────┐
//!                                       ▼              ▼              ▼
//!                                 [ViewerSession] [ViewerSession] [ViewerSession]
//!                                       │              │              │
//!  viewers ◄──────WebSocket─────────────┴──────────────┴──────────────┘
//! ```
//!
//! Each frame is serialized once and cloned per viewer by reference
//! count. A viewer that fails or stalls is dropped from the registry
//! without disturbing the others, and viewers may join mid-run to pick
//! up the remainder of a stream. Status broadcasts bypass pacing.
//!
//! # Example
//!
//! ```no_run
//! use framecast_rs::{BridgeConfig, BridgeServer};
//!
//! #[tokio::main]
//! async fn main() -> framecast_rs::Result<()> {
//!     let server = BridgeServer::new(BridgeConfig::default());
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use broadcast::{Frame, FrameBroadcaster, StreamBatch};
pub use error::{Error, Result};
pub use registry::ClientRegistry;
pub use server::{BridgeConfig, BridgeServer};
