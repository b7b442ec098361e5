//! JSON wire protocol.
//!
//! Every message is a JSON object tagged by a `type` field. Inbound
//! messages decode into a closed set of variants; any other `type` decodes
//! to [`ClientMessage::Unknown`] and is ignored by the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tileworld_core::{PixelPos, Tile, TilePos};

use crate::error::ServerError;

pub type PlayerId = u64;

/// Encoded outbound message, shared between every recipient of a broadcast
pub type Frame = Arc<str>;

// ============================================================================
// Server → Client
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub position: PixelPos,
    pub id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "biome")]
    Biome { biome: u8 },

    #[serde(rename = "chunk")]
    Chunk {
        tiles: Vec<Option<Tile>>,
        position: PixelPos,
    },

    #[serde(rename = "world_data_", rename_all = "camelCase")]
    WorldData {
        height_map: Vec<i32>,
        size: WorldSize,
        spawn_position: PixelPos,
        local_id: PlayerId,
        players: Vec<PlayerSummary>,
    },

    #[serde(rename = "player_joined", rename_all = "camelCase")]
    PlayerJoined { player_id: PlayerId },

    #[serde(rename = "player_left", rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },

    #[serde(rename = "set_player_position", rename_all = "camelCase")]
    SetPlayerPosition {
        position: PixelPos,
        player_id: PlayerId,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Frame, ServerError> {
        Ok(serde_json::to_string(self)?.into())
    }
}

// ============================================================================
// Client → Server
// ============================================================================

/// Tile payload of a `SetTile` edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TileEdit {
    pub tile_index: i32,
    pub item_drop: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// New avatar position in pixels
    SetPosition { position: [f64; 2] },
    /// Replace one cell; `tile: null` (or missing) clears it
    SetTile {
        position: [f64; 2],
        #[serde(default)]
        tile: Option<TileEdit>,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Cell targeted by a `SetTile` position (fractional parts truncate)
pub fn edit_cell(position: [f64; 2]) -> (i64, i64) {
    (position[0] as i64, position[1] as i64)
}

/// Tile an edit places at `(x, y)`, `None` for a removal
pub fn edit_tile(x: i64, y: i64, edit: Option<TileEdit>) -> Option<Tile> {
    edit.map(|e| Tile {
        material_id: e.tile_index,
        item_drop_id: e.item_drop,
        position: TilePos::new(x as i32, y as i32),
    })
}
