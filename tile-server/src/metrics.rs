//! Server metrics: lock-free session and streaming counters with JSON export
//!
//! ## Endpoints
//! - `GET /metrics/json` returns a JSON snapshot of the counters below

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::api::AppState;

/// Shared metrics state (all lock-free atomics)
#[derive(Debug)]
pub struct ServerMetrics {
    pub connections_opened: AtomicU64,
    pub connections_closed: AtomicU64,
    /// Inbound text messages, decodable or not
    pub messages_received: AtomicU64,
    pub decode_failures: AtomicU64,
    pub chunks_revealed: AtomicU64,
    pub tile_edits: AtomicU64,
    /// Broadcast frames skipped because a session's buffer was full
    pub frames_dropped: AtomicU64,
    pub start_time: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self {
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            chunks_revealed: AtomicU64::new(0),
            tile_edits: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub world_ready: bool,
    pub players_online: usize,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub messages_received: u64,
    pub decode_failures: u64,
    pub chunks_revealed: u64,
    pub tile_edits: u64,
    pub frames_dropped: u64,
}

impl ServerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn snapshot(&self, world_ready: bool, players_online: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            world_ready,
            players_online,
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            chunks_revealed: self.chunks_revealed.load(Ordering::Relaxed),
            tile_edits: self.tile_edits.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// GET /metrics/json
// ============================================================================

pub async fn json_metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    let coordinator = state.gate.try_get();
    let players = coordinator.as_ref().map_or(0, |c| c.player_count());
    Json(state.metrics.snapshot(coordinator.is_some(), players))
}
