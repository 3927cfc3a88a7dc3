//! Process-wide relay counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the listeners and the broadcaster
///
/// All counters are monotonic and updated with relaxed atomics; they feed
/// logging and the stats endpoint, nothing else.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Viewer connections accepted since startup
    total_connections: AtomicU64,
    /// Batches streamed to completion
    batches_streamed: AtomicU64,
    /// Batches dropped because no viewer was connected
    batches_skipped: AtomicU64,
    /// Frames broadcast across all runs
    frames_streamed: AtomicU64,
    /// Status messages broadcast
    status_broadcasts: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_streamed(&self) {
        self.batches_streamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_streamed(&self) {
        self.frames_streamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_broadcast(&self) {
        self.status_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            batches_streamed: self.batches_streamed.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            frames_streamed: self.frames_streamed.load(Ordering::Relaxed),
            status_broadcasts: self.status_broadcasts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`RelayStats`] at one instant
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_connections: u64,
    pub batches_streamed: u64,
    pub batches_skipped: u64,
    pub frames_streamed: u64,
    pub status_broadcasts: u64,
}
