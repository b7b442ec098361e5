//! Session coordinator: the single authoritative owner of the world grid
//! and the player registry.
//!
//! ```text
//! ClientConnection (one per socket)
//!       │ join / leave / edit / position
//!       ▼
//! SessionCoordinator ──► RwLock<WorldGrid>     (edits: write, reveals: read)
//!       │            └─► Mutex<Registry>       (ids, sessions, positions)
//!       ▼
//! SessionHandle::try_deliver ──► bounded mpsc per session ──► socket writer
//! ```
//!
//! Every mutation goes through this type, so readers never observe a torn
//! cell or registry. Broadcasts never block: a session whose buffer is full
//! loses that frame, other sessions are unaffected.
//!
//! Lock order is registry, then world. Nothing takes the registry while
//! holding the world lock.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use tileworld_core::{PixelPos, Tile, WorldError, WorldGrid};

use crate::error::ServerError;
use crate::metrics::ServerMetrics;
use crate::protocol::{Frame, PlayerId, PlayerSummary, ServerMessage, WorldSize};

// ============================================================================
// Session handles
// ============================================================================

/// Outcome of a non-blocking delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Buffer full, frame dropped for this session only
    Dropped,
    /// Session is gone (writer ended)
    Closed,
}

/// Sending half of one session's outbound buffer
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Frame>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<Frame>) -> Self {
        Self { tx }
    }

    pub fn try_deliver(&self, frame: &Frame) -> Delivery {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

struct PlayerEntry {
    session: SessionHandle,
    position: PixelPos,
}

#[derive(Default)]
struct Registry {
    players: HashMap<PlayerId, PlayerEntry>,
    next_id: PlayerId,
}

impl Registry {
    fn summaries(&self) -> Vec<PlayerSummary> {
        let mut players: Vec<PlayerSummary> = self
            .players
            .iter()
            .map(|(id, entry)| PlayerSummary {
                position: entry.position,
                id: *id,
            })
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct SessionCoordinator {
    world: RwLock<WorldGrid>,
    registry: Mutex<Registry>,
    metrics: Arc<ServerMetrics>,
}

impl SessionCoordinator {
    pub fn new(world: WorldGrid, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            world: RwLock::new(world),
            registry: Mutex::new(Registry::default()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// Run `f` with shared read access to the world
    pub fn read_world<R>(&self, f: impl FnOnce(&WorldGrid) -> R) -> R {
        f(&*self.world.read())
    }

    pub fn world_size(&self) -> WorldSize {
        let world = self.world.read();
        WorldSize {
            x: world.width(),
            y: world.height(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.registry.lock().players.len()
    }

    pub fn players(&self) -> Vec<PlayerSummary> {
        self.registry.lock().summaries()
    }

    pub fn player_position(&self, id: PlayerId) -> Option<PixelPos> {
        self.registry.lock().players.get(&id).map(|p| p.position)
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register a session under a fresh id. Ids increase monotonically and
    /// are never reused, even after the player leaves.
    pub fn add_player(&self, session: SessionHandle) -> PlayerId {
        Self::allocate(&mut self.registry.lock(), session)
    }

    /// Deregister a player. Returns false if it was not registered.
    pub fn remove_player(&self, id: PlayerId) -> bool {
        self.registry.lock().players.remove(&id).is_some()
    }

    /// Spawn point above the ground of the middle column; also becomes the
    /// player's current position.
    pub fn spawn_position_for(&self, id: PlayerId) -> PixelPos {
        self.place_at_spawn(&mut self.registry.lock(), id)
    }

    pub fn set_player_position(&self, id: PlayerId, position: PixelPos) {
        if let Some(entry) = self.registry.lock().players.get_mut(&id) {
            entry.position = position;
        }
    }

    /// Register a session, place it at the spawn point and queue its
    /// `world_data_` message, all under the registry lock so no broadcast
    /// can reach the session before it.
    pub fn join(&self, session: SessionHandle) -> Result<(PlayerId, PixelPos), ServerError> {
        let mut registry = self.registry.lock();
        let id = Self::allocate(&mut registry, session.clone());
        let spawn = self.place_at_spawn(&mut registry, id);

        let (height_map, size) = {
            let world = self.world.read();
            let size = WorldSize {
                x: world.width(),
                y: world.height(),
            };
            (world.height_map().to_vec(), size)
        };

        let world_data = ServerMessage::WorldData {
            height_map,
            size,
            spawn_position: spawn,
            local_id: id,
            players: registry.summaries(),
        };

        let frame = match world_data.encode() {
            Ok(frame) => frame,
            Err(e) => {
                registry.players.remove(&id);
                return Err(e);
            }
        };
        if session.try_deliver(&frame) != Delivery::Sent {
            registry.players.remove(&id);
            return Err(ServerError::ConnectionClosed);
        }

        info!(player_id = id, players = registry.players.len(), "Player joined");
        Ok((id, spawn))
    }

    fn allocate(registry: &mut Registry, session: SessionHandle) -> PlayerId {
        let id = registry.next_id;
        registry.next_id += 1;
        registry.players.insert(
            id,
            PlayerEntry {
                session,
                position: PixelPos::default(),
            },
        );
        id
    }

    /// Caller holds the registry lock; takes the world read lock after it
    fn place_at_spawn(&self, registry: &mut Registry, id: PlayerId) -> PixelPos {
        let spawn = self.world.read().spawn_position();
        if let Some(entry) = registry.players.get_mut(&id) {
            entry.position = spawn;
        }
        spawn
    }

    /// Deregister and tell everyone else. Safe to call for an id that is
    /// already gone; the broadcast only happens on the first call.
    pub fn leave(&self, id: PlayerId) {
        if self.remove_player(id) {
            info!(player_id = id, "Player left");
            self.broadcast_player_left(id);
        }
    }

    // ------------------------------------------------------------------
    // World
    // ------------------------------------------------------------------

    /// Replace one cell. The edit itself is trusted; only coordinates
    /// outside the grid are rejected. The height map is left untouched.
    pub fn apply_tile_edit(&self, x: i64, y: i64, tile: Option<Tile>) -> Result<(), WorldError> {
        self.world.write().set_tile(x, y, tile)?;
        ServerMetrics::incr(&self.metrics.tile_edits);
        debug!(x, y, placed = tile.is_some(), "Tile edited");
        Ok(())
    }

    pub fn biome_at(&self, position: PixelPos) -> u8 {
        self.world.read().biome_at(position)
    }

    // ------------------------------------------------------------------
    // Fan-out
    // ------------------------------------------------------------------

    pub fn broadcast_position_update(&self, id: PlayerId, position: PixelPos) {
        self.broadcast_message(
            Some(id),
            &ServerMessage::SetPlayerPosition {
                position,
                player_id: id,
            },
        );
    }

    pub fn broadcast_player_joined(&self, id: PlayerId) {
        self.broadcast_message(Some(id), &ServerMessage::PlayerJoined { player_id: id });
    }

    pub fn broadcast_player_left(&self, id: PlayerId) {
        self.broadcast_message(Some(id), &ServerMessage::PlayerLeft { player_id: id });
    }

    /// Relay an already-encoded frame (e.g. a verbatim inbound edit)
    pub fn broadcast_raw(&self, from: PlayerId, frame: Frame) {
        self.broadcast_except(Some(from), &frame);
    }

    fn broadcast_message(&self, except: Option<PlayerId>, message: &ServerMessage) {
        match message.encode() {
            Ok(frame) => {
                self.broadcast_except(except, &frame);
            }
            Err(e) => warn!(error = %e, "Failed to encode broadcast"),
        }
    }

    /// Deliver to every session except `except`. Returns how many sessions
    /// accepted the frame.
    pub fn broadcast_except(&self, except: Option<PlayerId>, frame: &Frame) -> usize {
        let registry = self.registry.lock();
        let mut delivered = 0;
        for (id, entry) in &registry.players {
            if Some(*id) == except {
                continue;
            }
            match entry.session.try_deliver(frame) {
                Delivery::Sent => delivered += 1,
                Delivery::Dropped => {
                    ServerMetrics::incr(&self.metrics.frames_dropped);
                    warn!(player_id = *id, "Outbound buffer full, frame dropped");
                }
                Delivery::Closed => debug!(player_id = *id, "Session closing, frame skipped"),
            }
        }
        delivered
    }
}
