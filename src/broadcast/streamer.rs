//! Paced frame broadcasting
//!
//! One [`FrameBroadcaster::run`] call streams one batch: each frame is
//! serialized once, fanned out to a fresh registry snapshot, and paced so
//! that frame `i` goes out at a fixed offset from stream start. Viewers
//! may join or fail mid-run without disturbing anyone else.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{self, Instant};

use crate::registry::{ClientRegistry, RegistryError};
use crate::stats::RelayStats;

use super::frame::{StreamBatch, StreamEnd, StatusMessage, WireMessage};

/// Upper bound on one viewer's send before it counts as failed
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// Streams frame batches to every registered viewer at their target rate
///
/// Cheap to clone; clones share the same registry and stats. `run` takes
/// `&self` and may be invoked concurrently: concurrent batches interleave
/// their sends, each with its own pacing clock.
#[derive(Clone)]
pub struct FrameBroadcaster {
    registry: Arc<ClientRegistry>,
    stats: Arc<RelayStats>,
    send_timeout: Duration,
}

impl FrameBroadcaster {
    /// Create a broadcaster over the given registry
    pub fn new(registry: Arc<ClientRegistry>, stats: Arc<RelayStats>) -> Self {
        Self {
            registry,
            stats,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the per-viewer send timeout
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Stream one batch to all connected viewers at its target rate
    ///
    /// Frame `i` is emitted at `start + (i+1)/fps`. If a tick runs long
    /// the loop proceeds immediately without skipping frames; drift
    /// accumulates rather than altering frame order or count. After the
    /// last frame a terminal marker goes out with the same
    /// fire-and-forget semantics.
    pub async fn run(&self, batch: StreamBatch) {
        if let Err(e) = batch.validate() {
            tracing::error!(error = %e, "Rejecting unstreamable batch");
            return;
        }

        // Deliberate short-circuit: with no observers there is nothing to
        // pace, and the producer should not be made to look "live".
        if self.registry.client_count().await == 0 {
            tracing::info!(frames = batch.len(), "No viewers connected, skipping batch");
            self.stats.record_batch_skipped();
            return;
        }

        let interval = batch.interval();
        let total = batch.len();
        let start = Instant::now();

        tracing::info!(frames = total, fps = batch.fps, "Streaming batch");

        for (i, frame) in batch.frames.iter().enumerate() {
            match WireMessage::json(frame) {
                Ok(payload) => {
                    self.fan_out(&payload).await;
                    self.stats.record_frame_streamed();
                }
                Err(e) => {
                    // Unreachable for JSON-sourced frames; pacing continues
                    tracing::error!(frame = i, error = %e, "Failed to serialize frame");
                }
            }

            // Absolute deadline from stream start, so send latency inside
            // the tick is absorbed instead of stacking up.
            time::sleep_until(start + interval.mul_f64((i + 1) as f64)).await;
        }

        match WireMessage::json(&StreamEnd::new(total)) {
            Ok(payload) => {
                self.fan_out(&payload).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize terminal marker"),
        }

        self.stats.record_batch_streamed();
        tracing::info!(
            frames = total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stream complete"
        );
    }

    /// Broadcast a status text to all current viewers, bypassing pacing
    pub async fn broadcast_status(&self, text: &str) {
        match WireMessage::json(&StatusMessage::new(text)) {
            Ok(payload) => {
                let delivered = self.fan_out(&payload).await;
                self.stats.record_status_broadcast();
                tracing::info!(delivered = delivered, status = text, "Status broadcast");
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize status"),
        }
    }

    /// Send one payload to a fresh snapshot of the registry
    ///
    /// Sends run concurrently and are awaited as a group, each bounded by
    /// the send timeout. A failed or timed-out viewer is deregistered and
    /// never stalls the others. Returns the number of successful sends.
    async fn fan_out(&self, payload: &WireMessage) -> usize {
        let viewers = self.registry.snapshot().await;
        if viewers.is_empty() {
            return 0;
        }

        let sends = viewers.iter().map(|viewer| {
            let payload = payload.clone();
            async move {
                match time::timeout(self.send_timeout, viewer.send(payload)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(RegistryError::SendTimeout(viewer.id())),
                }
            }
        });

        let mut delivered = 0;
        for result in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        client_id = %e.client_id(),
                        error = %e,
                        "Dropping viewer after failed send"
                    );
                    self.registry.deregister(e.client_id()).await;
                }
            }
        }

        delivered
    }

    /// The registry this broadcaster fans out to
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};
    use tokio::sync::mpsc;

    use crate::broadcast::Frame;
    use crate::registry::{ClientId, ViewerHandle};

    use super::*;

    fn broadcaster() -> (Arc<ClientRegistry>, FrameBroadcaster) {
        let registry = Arc::new(ClientRegistry::new());
        let stats = Arc::new(RelayStats::new());
        (Arc::clone(&registry), FrameBroadcaster::new(registry, stats))
    }

    fn batch(frames: usize, fps: f64) -> StreamBatch {
        batch_from(0, frames, fps)
    }

    fn batch_from(first_t: usize, frames: usize, fps: f64) -> StreamBatch {
        StreamBatch {
            fps,
            frames: (first_t..first_t + frames)
                .map(|i| Frame {
                    t: i as f64,
                    params: Map::new(),
                    extra: Map::new(),
                })
                .collect(),
        }
    }

    async fn viewer(registry: &ClientRegistry, id: u64, capacity: usize) -> mpsc::Receiver<WireMessage> {
        let (handle, rx) = ViewerHandle::channel(ClientId::new(id), capacity);
        registry.register(handle).await;
        rx
    }

    fn parse(msg: &WireMessage) -> Value {
        serde_json::from_slice(msg.as_bytes()).unwrap()
    }

    /// Drain a receiver, returning (frame timestamps in order, terminal marker)
    async fn drain(rx: &mut mpsc::Receiver<WireMessage>) -> (Vec<f64>, Option<Value>) {
        let mut ts = Vec::new();
        let mut end = None;
        while let Ok(msg) = rx.try_recv() {
            let value = parse(&msg);
            if value.get("end").is_some() {
                end = Some(value);
                break;
            }
            ts.push(value["t"].as_f64().unwrap());
        }
        (ts, end)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_order_and_terminal_marker() {
        let (registry, broadcaster) = broadcaster();
        let mut rx1 = viewer(&registry, 1, 64).await;
        let mut rx2 = viewer(&registry, 2, 64).await;

        broadcaster.run(batch(10, 30.0)).await;

        for rx in [&mut rx1, &mut rx2] {
            let (ts, end) = drain(rx).await;
            assert_eq!(ts, (0..10).map(|i| i as f64).collect::<Vec<_>>());
            let end = end.unwrap();
            assert_eq!(end["end"], Value::Bool(true));
            assert_eq!(end["total_frames"], Value::from(10));
            // Nothing after the terminal marker
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_matches_target_rate() {
        let (registry, broadcaster) = broadcaster();
        let _rx = viewer(&registry, 1, 64).await;

        let start = Instant::now();
        broadcaster.run(batch(30, 30.0)).await;
        let elapsed = start.elapsed();

        // 30 frames at 30 fps: one second, within one frame interval
        assert!(elapsed >= Duration::from_secs(1), "elapsed {:?}", elapsed);
        assert!(
            elapsed <= Duration::from_secs(1) + Duration::from_millis(34),
            "elapsed {:?}",
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_viewers_skips_without_delay() {
        let (_registry, broadcaster) = broadcaster();

        let start = Instant::now();
        broadcaster.run(batch(100, 30.0)).await;

        assert!(start.elapsed() < Duration::from_millis(33));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_still_emits_terminal_marker() {
        let (registry, broadcaster) = broadcaster();
        let mut rx = viewer(&registry, 1, 4).await;

        broadcaster.run(batch(0, 30.0)).await;

        let (ts, end) = drain(&mut rx).await;
        assert!(ts.is_empty());
        assert_eq!(end.unwrap()["total_frames"], Value::from(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_viewer_is_isolated_and_deregistered() {
        let (registry, broadcaster) = broadcaster();
        let mut healthy = viewer(&registry, 1, 64).await;
        let dead = viewer(&registry, 2, 4).await;
        drop(dead);

        broadcaster.run(batch(5, 50.0)).await;

        let (ts, end) = drain(&mut healthy).await;
        assert_eq!(ts.len(), 5);
        assert!(end.is_some());
        // The dead viewer was dropped from the registry on first failure
        assert_eq!(registry.client_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_viewer_times_out_and_is_dropped() {
        let (registry, broadcaster) = broadcaster();
        let broadcaster = broadcaster.with_send_timeout(Duration::from_millis(100));
        let mut healthy = viewer(&registry, 1, 64).await;
        // Capacity 1 with no reader: accepts one payload, then stalls
        let _stalled = viewer(&registry, 2, 1).await;

        broadcaster.run(batch(4, 50.0)).await;

        let (ts, end) = drain(&mut healthy).await;
        assert_eq!(ts, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(end.is_some());
        assert_eq!(registry.client_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_batches_interleave_safely() {
        let (registry, broadcaster) = broadcaster();
        let mut rx = viewer(&registry, 1, 64).await;

        tokio::join!(
            broadcaster.run(batch_from(0, 5, 25.0)),
            broadcaster.run(batch_from(100, 5, 50.0)),
        );

        let mut low = Vec::new();
        let mut high = Vec::new();
        let mut ends = 0;
        while let Ok(msg) = rx.try_recv() {
            let value = parse(&msg);
            if value.get("end").is_some() {
                ends += 1;
            } else {
                let t = value["t"].as_f64().unwrap();
                if t < 100.0 {
                    low.push(t);
                } else {
                    high.push(t);
                }
            }
        }

        // Each batch keeps its own order; the interleaving is free
        assert_eq!(low, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(high, vec![100.0, 101.0, 102.0, 103.0, 104.0]);
        assert_eq!(ends, 2);
    }

    #[tokio::test]
    async fn test_late_joiner_receives_remainder() {
        let (registry, broadcaster) = broadcaster();
        let mut rx1 = viewer(&registry, 1, 64).await;

        let run = {
            let broadcaster = broadcaster.clone();
            tokio::spawn(async move { broadcaster.run(batch(10, 20.0)).await })
        };

        // Wait until frame 5 has been delivered, then join
        for _ in 0..6 {
            rx1.recv().await.unwrap();
        }
        let mut rx2 = viewer(&registry, 2, 64).await;

        run.await.unwrap();

        let mut late_ts = Vec::new();
        let mut end = None;
        while let Ok(msg) = rx2.try_recv() {
            let value = parse(&msg);
            if value.get("end").is_some() {
                end = Some(value);
            } else {
                late_ts.push(value["t"].as_f64().unwrap());
            }
        }

        // Frames 0-5 went out before the join; the rest arrive in order
        assert_eq!(late_ts, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(end.unwrap()["total_frames"], Value::from(10));
    }

    #[tokio::test]
    async fn test_status_broadcast_is_immediate() {
        let (registry, broadcaster) = broadcaster();
        let mut rx = viewer(&registry, 1, 4).await;

        broadcaster.broadcast_status("take ready").await;

        let value = parse(&rx.recv().await.unwrap());
        assert_eq!(
            value,
            serde_json::json!({"status": "take ready", "type": "status"})
        );
    }
}
