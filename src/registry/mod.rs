//! Viewer registry for broadcast fan-out
//!
//! The registry is the single shared set of connected viewers. The
//! connection path registers a handle on WebSocket upgrade and
//! deregisters it on disconnect; the broadcaster snapshots the set once
//! per frame tick and deregisters viewers whose sends fail.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ClientRegistry>
//!                  ┌──────────────────────────┐
//!                  │ clients: HashMap<        │
//!                  │   ClientId,              │
//!                  │   ViewerHandle {         │
//!                  │     tx: mpsc::Sender,    │
//!                  │   }                      │
//!                  │ >                        │
//!                  └────────────┬─────────────┘
//!                               │ snapshot() per tick
//!          ┌────────────────────┼────────────────────┐
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//!     [Broadcaster]       [ViewerSession]      [ViewerSession]
//!     fan_out()           outbound.recv()      outbound.recv()
//!          │                    │                    │
//!          └──► handle.send() ──► socket.send() ──► WebSocket
//! ```
//!
//! # Zero-Copy Design
//!
//! Each frame is serialized once into a [`WireMessage`] backed by
//! `bytes::Bytes`; the per-viewer sends clone the handle's payload, but
//! the underlying buffer is only reference-counted, not copied.
//!
//! [`WireMessage`]: crate::broadcast::WireMessage

pub mod error;
pub mod handle;
pub mod store;

pub use error::RegistryError;
pub use handle::{ClientId, ViewerHandle};
pub use store::ClientRegistry;
