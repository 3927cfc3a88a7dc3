//! Frame broadcast engine
//!
//! The core of the bridge: [`FrameBroadcaster`] takes a [`StreamBatch`]
//! and emits its frames to every registered viewer at the batch's target
//! rate, closing the run with a [`StreamEnd`] marker. Status broadcasts
//! go through the same fan-out but skip pacing entirely.

pub mod frame;
pub mod streamer;

pub use frame::{Frame, StatusMessage, StreamBatch, StreamEnd, WireMessage, DEFAULT_FPS};
pub use streamer::{FrameBroadcaster, DEFAULT_SEND_TIMEOUT};
