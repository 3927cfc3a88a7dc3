//! Frame and wire message types
//!
//! Everything that crosses the wire: the frames a producer submits, the
//! batch envelope around them, and the messages viewers receive. Frame
//! contents are opaque to the broadcast engine; it only cares about a
//! frame's ordinal position in its batch.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Frame rate applied when a batch does not specify one
pub const DEFAULT_FPS: f64 = 30.0;

/// One timestamped unit of animation parameter data
///
/// The broadcast engine passes `params` (and any extra producer-defined
/// fields) through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp in seconds, relative to the start of the take
    pub t: f64,
    /// Producer-defined animation parameters
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Additional producer fields, preserved across the relay
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An ordered frame sequence plus its target rate
///
/// Created by a single ingest call, owned by the broadcaster for one
/// streaming run, then discarded.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamBatch {
    /// Target frame rate (frames per second)
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Ordered frames to stream
    #[serde(default)]
    pub frames: Vec<Frame>,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

impl StreamBatch {
    /// Check the batch invariants
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(Error::InvalidBatch(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Wall-clock spacing between consecutive frames
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Number of frames in the batch
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the batch carries no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Terminal marker closing out a streaming run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEnd {
    /// Always `true`; marks this message as the end of a run
    pub end: bool,
    /// Number of frames the run delivered
    pub total_frames: usize,
}

impl StreamEnd {
    /// Marker for a run of `total_frames` frames
    pub fn new(total_frames: usize) -> Self {
        Self {
            end: true,
            total_frames,
        }
    }
}

/// Out-of-band text broadcast, delivered outside any run's pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    /// The status text
    pub status: String,
    /// Message discriminator, always `"status"`
    #[serde(rename = "type")]
    pub kind: String,
}

impl StatusMessage {
    /// Wrap a status text for broadcast
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            status: text.into(),
            kind: "status".into(),
        }
    }
}

/// One serialized JSON payload, shared across viewers without copying
///
/// Built once per broadcast; the per-viewer clones only bump a reference
/// count on the underlying buffer.
#[derive(Debug, Clone)]
pub struct WireMessage(Bytes);

impl WireMessage {
    /// Serialize a value into a wire payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(Bytes::from(serde_json::to_string(value)?)))
    }

    /// The raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The payload as text
    ///
    /// Payloads are produced by `serde_json::to_string`, so the bytes
    /// are always valid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}
