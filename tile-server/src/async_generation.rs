//! Background world generation and the readiness gate.
//!
//! ```text
//! main ──spawn_generation──► [blocking pool] TerrainGenerator::generate
//!   │                                 │
//!   │                                 ▼ WorldPublisher::publish
//!   └──► WorldGate (watch) ◄──── Some(Arc<SessionCoordinator>)
//!              ▲
//!              └── connections wait here before touching the grid
//! ```
//!
//! The listener starts immediately; a client that connects early parks on
//! [`WorldGate::wait`] instead of reading a partially built grid. If
//! generation fails the publisher is dropped and every waiter is released
//! with [`ServerError::GenerationAborted`].

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use tileworld_core::{GeneratorConfig, TerrainGenerator};

use crate::coordinator::SessionCoordinator;
use crate::error::ServerError;
use crate::metrics::ServerMetrics;

type Slot = Option<Arc<SessionCoordinator>>;

/// Write side of the gate, consumed by the generation task
pub struct WorldPublisher {
    tx: watch::Sender<Slot>,
}

impl WorldPublisher {
    pub fn publish(self, coordinator: Arc<SessionCoordinator>) {
        self.tx.send_replace(Some(coordinator));
    }
}

/// Cloneable read side of the gate, empty until generation finishes
#[derive(Clone)]
pub struct WorldGate {
    rx: watch::Receiver<Slot>,
}

impl WorldGate {
    pub fn channel() -> (WorldPublisher, WorldGate) {
        let (tx, rx) = watch::channel(None);
        (WorldPublisher { tx }, WorldGate { rx })
    }

    /// Gate that is open from the start
    pub fn open(coordinator: Arc<SessionCoordinator>) -> Self {
        let (tx, rx) = watch::channel(Some(coordinator));
        drop(tx);
        Self { rx }
    }

    pub fn try_get(&self) -> Option<Arc<SessionCoordinator>> {
        self.rx.borrow().clone()
    }

    pub async fn wait(&self) -> Result<Arc<SessionCoordinator>, ServerError> {
        let mut rx = self.rx.clone();
        let published = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ServerError::GenerationAborted)?;
        published.clone().ok_or(ServerError::GenerationAborted)
    }
}

/// Generate the world on the blocking pool and publish it through the
/// returned gate.
pub fn spawn_generation(
    config: GeneratorConfig,
    metrics: Arc<ServerMetrics>,
) -> (WorldGate, JoinHandle<Result<(), ServerError>>) {
    let (publisher, gate) = WorldGate::channel();

    let handle = tokio::spawn(async move {
        let started = Instant::now();
        info!(width = config.width, height = config.height, seed = config.seed, "🌍 Generating world...");

        let world = tokio::task::spawn_blocking(move || TerrainGenerator::new(config).generate())
            .await
            .map_err(|e| {
                error!(error = %e, "World generation task failed");
                ServerError::GenerationAborted
            })??;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            digest = %world.digest_hex(),
            "✅ World ready"
        );
        publisher.publish(Arc::new(SessionCoordinator::new(world, metrics)));
        Ok(())
    });

    (gate, handle)
}
