//! World grid data model.
//!
//! The world is a dense, column-major arena of `Option<Tile>` cells plus a
//! parallel biome map and a per-column height map. `None` is air. Tiles are
//! plain `Copy` records, replaced wholesale on edit and never mutated in place.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::constants::{CHUNK_SIZE, SPAWN_HEIGHT_OFFSET, TILE_SIZE};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Cell ({x}, {y}) is outside the {width}x{height} world")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    #[error("Invalid world dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

// ============================================================================
// Coordinates
// ============================================================================

/// Position in tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Position in pixel coordinates (what clients report)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Tile column/row containing this pixel (may be outside the world)
    pub fn to_tile(self) -> (i64, i64) {
        (
            (self.x / TILE_SIZE).floor() as i64,
            (self.y / TILE_SIZE).floor() as i64,
        )
    }
}

// ============================================================================
// Tile
// ============================================================================

/// A solid cell. Air is represented by the absence of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    #[serde(rename = "tileIndex")]
    pub material_id: i32,
    #[serde(rename = "itemDrop")]
    pub item_drop_id: i32,
    pub position: TilePos,
}

impl Tile {
    pub fn new(material_id: i32, item_drop_id: i32, x: usize, y: usize) -> Self {
        Self {
            material_id,
            item_drop_id,
            position: TilePos::new(x as i32, y as i32),
        }
    }
}

// ============================================================================
// WorldGrid
// ============================================================================

/// Dense world storage. Cells are stored column-major (`x * height + y`) so a
/// chunk column is one contiguous slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Tile>>,
    biome_map: Vec<u8>,
    height_map: Vec<i32>,
}

impl WorldGrid {
    /// An all-air world with biome 0 everywhere and a zero height map.
    pub fn empty(width: usize, height: usize) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![None; width * height],
            biome_map: vec![0; width * height],
            height_map: vec![0; width],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        x * self.height + y
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Tile at `(x, y)`, `None` for air. Panics when out of range.
    pub fn tile(&self, x: usize, y: usize) -> Option<Tile> {
        self.cells[self.index(x, y)]
    }

    /// Contiguous run of cells `ys` in column `x`
    pub fn column(&self, x: usize, ys: std::ops::Range<usize>) -> &[Option<Tile>] {
        let base = x * self.height;
        &self.cells[base + ys.start..base + ys.end]
    }

    pub(crate) fn put(&mut self, x: usize, y: usize, tile: Option<Tile>) {
        let i = self.index(x, y);
        self.cells[i] = tile;
    }

    /// Replace exactly one cell. Coordinates come from clients, so they are
    /// checked; everything else about the edit is trusted.
    pub fn set_tile(&mut self, x: i64, y: i64, tile: Option<Tile>) -> Result<(), WorldError> {
        if !self.in_bounds(x, y) {
            return Err(WorldError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.put(x as usize, y as usize, tile);
        Ok(())
    }

    pub fn biome(&self, x: usize, y: usize) -> u8 {
        self.biome_map[self.index(x, y)]
    }

    pub(crate) fn set_biome(&mut self, x: usize, y: usize, biome: u8) {
        let i = self.index(x, y);
        self.biome_map[i] = biome;
    }

    /// Biome under a pixel position, clamped into the world
    pub fn biome_at(&self, position: PixelPos) -> u8 {
        let (tx, ty) = position.to_tile();
        let x = tx.clamp(0, self.width as i64 - 1) as usize;
        let y = ty.clamp(0, self.height as i64 - 1) as usize;
        self.biome(x, y)
    }

    /// Surface row per column, as produced by generation. Edits never update it.
    pub fn height_map(&self) -> &[i32] {
        &self.height_map
    }

    pub(crate) fn set_surface(&mut self, x: usize, row: i32) {
        self.height_map[x] = row;
    }

    /// Number of chunks along each axis (partial chunks count)
    pub fn chunk_dims(&self) -> (usize, usize) {
        (
            self.width.div_ceil(CHUNK_SIZE),
            self.height.div_ceil(CHUNK_SIZE),
        )
    }

    /// First non-empty cell from the top of the middle column; row 0 when the
    /// column is entirely air.
    pub fn spawn_tile(&self) -> (usize, usize) {
        let x = self.width / 2;
        let y = self
            .column(x, 0..self.height)
            .iter()
            .position(Option::is_some)
            .unwrap_or(0);
        (x, y)
    }

    /// Pixel spawn position just above the ground of the middle column
    pub fn spawn_position(&self) -> PixelPos {
        let (x, y) = self.spawn_tile();
        PixelPos::new(
            x as f64 * TILE_SIZE,
            y as f64 * TILE_SIZE - SPAWN_HEIGHT_OFFSET,
        )
    }

    /// SHA3-256 over dimensions, cells, biome map and height map
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update((self.width as u64).to_le_bytes());
        hasher.update((self.height as u64).to_le_bytes());
        for cell in &self.cells {
            match cell {
                Some(tile) => {
                    hasher.update([1u8]);
                    hasher.update(tile.material_id.to_le_bytes());
                    hasher.update(tile.item_drop_id.to_le_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update(&self.biome_map);
        for row in &self.height_map {
            hasher.update(row.to_le_bytes());
        }
        hasher.finalize().into()
    }

    pub fn digest_hex(&self) -> String {
        self.digest().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(x: usize, y: usize) -> Option<Tile> {
        Some(Tile::new(1, 0, x, y))
    }

    #[test]
    fn test_empty_rejects_zero_dimensions() {
        assert_eq!(
            WorldGrid::empty(0, 10),
            Err(WorldError::InvalidDimensions { width: 0, height: 10 })
        );
        assert!(WorldGrid::empty(10, 0).is_err());
    }

    #[test]
    fn test_set_tile_replaces_one_cell() {
        let mut grid = WorldGrid::empty(4, 4).unwrap();
        grid.set_tile(2, 3, solid(2, 3)).unwrap();
        assert_eq!(grid.tile(2, 3), solid(2, 3));
        assert_eq!(grid.tile(3, 2), None);

        grid.set_tile(2, 3, None).unwrap();
        assert_eq!(grid.tile(2, 3), None);
    }

    #[test]
    fn test_set_tile_out_of_bounds() {
        let mut grid = WorldGrid::empty(4, 4).unwrap();
        let err = grid.set_tile(4, 0, None).unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { x: 4, y: 0, .. }));
        assert!(grid.set_tile(-1, 0, None).is_err());
        assert!(grid.set_tile(0, -1, None).is_err());
    }

    #[test]
    fn test_column_is_contiguous() {
        let mut grid = WorldGrid::empty(3, 5).unwrap();
        grid.put(1, 2, solid(1, 2));
        grid.put(1, 4, solid(1, 4));
        let col = grid.column(1, 2..5);
        assert_eq!(col, &[solid(1, 2), None, solid(1, 4)]);
    }

    #[test]
    fn test_biome_at_clamps() {
        let mut grid = WorldGrid::empty(2, 2).unwrap();
        grid.set_biome(1, 1, 3);
        assert_eq!(grid.biome_at(PixelPos::new(1000.0, 1000.0)), 3);
        assert_eq!(grid.biome_at(PixelPos::new(-50.0, -50.0)), 0);
        assert_eq!(grid.biome_at(PixelPos::new(45.0, 41.0)), 3);
    }

    #[test]
    fn test_spawn_position_above_first_solid() {
        let mut grid = WorldGrid::empty(10, 10).unwrap();
        grid.put(5, 6, solid(5, 6));
        grid.put(5, 8, solid(5, 8));
        assert_eq!(grid.spawn_tile(), (5, 6));
        assert_eq!(grid.spawn_position(), PixelPos::new(200.0, 150.0));
    }

    #[test]
    fn test_spawn_in_empty_column() {
        let grid = WorldGrid::empty(10, 10).unwrap();
        assert_eq!(grid.spawn_tile(), (5, 0));
        assert_eq!(grid.spawn_position(), PixelPos::new(200.0, -90.0));
    }

    #[test]
    fn test_chunk_dims_round_up() {
        let grid = WorldGrid::empty(1750, 900).unwrap();
        assert_eq!(grid.chunk_dims(), (35, 18));
        let grid = WorldGrid::empty(51, 1).unwrap();
        assert_eq!(grid.chunk_dims(), (2, 1));
    }

    #[test]
    fn test_digest_tracks_edits() {
        let mut grid = WorldGrid::empty(4, 4).unwrap();
        let before = grid.digest();
        grid.set_tile(0, 0, solid(0, 0)).unwrap();
        assert_ne!(before, grid.digest());
        grid.set_tile(0, 0, None).unwrap();
        assert_eq!(before, grid.digest());
        assert_eq!(grid.digest_hex().len(), 64);
    }

    #[test]
    fn test_tile_json_shape() {
        let json = serde_json::to_value(Tile::new(7, 3, 2, 9)).unwrap();
        assert_eq!(json["tileIndex"], 7);
        assert_eq!(json["itemDrop"], 3);
        assert_eq!(json["position"]["x"], 2);
        assert_eq!(json["position"]["y"], 9);
    }
}
