//! Per-connection session state.
//!
//! A [`ClientConnection`] is created once the world is ready and a socket
//! has been accepted. It owns the client's [`VisibilityTracker`] and the
//! sending half of the client's outbound buffer. Teardown (deregister,
//! `player_left` broadcast) runs in `Drop`, so it happens exactly once no
//! matter how the socket ended.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tileworld_core::{PixelPos, VisibilityTracker};

use crate::coordinator::{SessionCoordinator, SessionHandle};
use crate::error::ServerError;
use crate::metrics::ServerMetrics;
use crate::protocol::{edit_cell, edit_tile, ClientMessage, Frame, PlayerId, ServerMessage};

pub struct ClientConnection {
    id: PlayerId,
    coordinator: Arc<SessionCoordinator>,
    outbound: mpsc::Sender<Frame>,
    tracker: VisibilityTracker,
    position: PixelPos,
    biome: u8,
}

impl ClientConnection {
    /// Join the world: `world_data_` to this client, `player_joined` to the
    /// others, then the first reveal/biome/position round at the spawn point.
    pub async fn open(
        coordinator: Arc<SessionCoordinator>,
        outbound: mpsc::Sender<Frame>,
    ) -> Result<Self, ServerError> {
        let (id, spawn) = coordinator.join(SessionHandle::new(outbound.clone()))?;
        let tracker = coordinator.read_world(VisibilityTracker::for_world);
        ServerMetrics::incr(&coordinator.metrics().connections_opened);

        let mut conn = Self {
            id,
            coordinator,
            outbound,
            tracker,
            position: spawn,
            biome: 0,
        };

        conn.coordinator.broadcast_player_joined(id);
        conn.update_position(spawn).await?;
        info!(player_id = id, x = spawn.x, y = spawn.y, "🎮 Client connected");
        Ok(conn)
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn position(&self) -> PixelPos {
        self.position
    }

    pub fn biome(&self) -> u8 {
        self.biome
    }

    pub fn discovered_chunks(&self) -> usize {
        self.tracker.discovered_count()
    }

    /// Handle one inbound text frame. Malformed input is logged and dropped;
    /// only a closed outbound buffer is an error.
    pub async fn on_message(&mut self, text: &str) -> Result<(), ServerError> {
        let metrics = self.coordinator.metrics().clone();
        ServerMetrics::incr(&metrics.messages_received);

        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                ServerMetrics::incr(&metrics.decode_failures);
                warn!(player_id = self.id, error = %e, "Dropping undecodable message");
                return Ok(());
            }
        };

        match message {
            ClientMessage::SetPosition { position } => {
                self.update_position(PixelPos::new(position[0], position[1]))
                    .await
            }
            ClientMessage::SetTile { position, tile } => {
                let (x, y) = edit_cell(position);
                match self.coordinator.apply_tile_edit(x, y, edit_tile(x, y, tile)) {
                    Ok(()) => self.coordinator.broadcast_raw(self.id, Frame::from(text)),
                    Err(e) => warn!(player_id = self.id, error = %e, "Rejected tile edit"),
                }
                Ok(())
            }
            ClientMessage::Unknown => {
                debug!(player_id = self.id, "Ignoring unknown message type");
                Ok(())
            }
        }
    }

    /// Reveal newly visible chunks, report the biome underfoot, then tell
    /// everyone else where this player is.
    pub async fn update_position(&mut self, position: PixelPos) -> Result<(), ServerError> {
        self.position = position;

        let reveal = {
            let tracker = &mut self.tracker;
            self.coordinator
                .read_world(|world| tracker.reveal(world, position))
        };
        if let Some(reveal) = reveal {
            ServerMetrics::add(
                &self.coordinator.metrics().chunks_revealed,
                reveal.chunks.len() as u64,
            );
            debug!(player_id = self.id, chunks = reveal.chunks.len(), "Revealing chunks");
            self.send(&ServerMessage::Chunk {
                tiles: reveal.tiles,
                position,
            })
            .await?;
        }

        self.biome = self.coordinator.biome_at(position);
        self.send(&ServerMessage::Biome { biome: self.biome }).await?;

        self.coordinator.set_player_position(self.id, position);
        self.coordinator.broadcast_position_update(self.id, position);
        Ok(())
    }

    async fn send(&self, message: &ServerMessage) -> Result<(), ServerError> {
        let frame = message.encode()?;
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ServerError::ConnectionClosed)
    }

    /// Explicit close; equivalent to dropping the connection
    pub fn close(self) {}
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        self.coordinator.leave(self.id);
        ServerMetrics::incr(&self.coordinator.metrics().connections_closed);
        info!(
            player_id = self.id,
            chunks_seen = self.tracker.discovered_count(),
            "👋 Client disconnected"
        );
    }
}
