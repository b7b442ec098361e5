//! Per-client chunk visibility tracking.
//!
//! The world is partitioned into 50x50-tile chunks. Each connected client
//! owns one [`VisibilityTracker`]; on every position update the 3x3 block of
//! chunks around the client is checked and only chunks never sent before
//! are revealed. Discovery is monotonic: a chunk is revealed to a client at
//! most once for the lifetime of its connection, even if edits later change
//! its contents (edits travel on the broadcast path instead).
//!
//! Lifecycle: the tracker is created when the connection opens (all chunks
//! undiscovered), lives while the connection is active, and is dropped with
//! the connection.

use crate::constants::{CHUNK_SIZE, TILE_SIZE};
use crate::world::{PixelPos, Tile, WorldGrid};

/// Chunk index along x and y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: usize,
    pub y: usize,
}

/// Newly revealed chunks and their tiles, chunk by chunk, each chunk
/// scanned column-major (x outer, y inner) and clipped to the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReveal {
    pub chunks: Vec<ChunkCoord>,
    pub tiles: Vec<Option<Tile>>,
}

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    world_width: usize,
    world_height: usize,
    chunks_width: usize,
    chunks_height: usize,
    discovered: Vec<bool>,
    discovered_count: usize,
}

impl VisibilityTracker {
    pub fn new(world_width: usize, world_height: usize) -> Self {
        let chunks_width = world_width.div_ceil(CHUNK_SIZE);
        let chunks_height = world_height.div_ceil(CHUNK_SIZE);
        Self {
            world_width,
            world_height,
            chunks_width,
            chunks_height,
            discovered: vec![false; chunks_width * chunks_height],
            discovered_count: 0,
        }
    }

    pub fn for_world(grid: &WorldGrid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    pub fn chunk_dims(&self) -> (usize, usize) {
        (self.chunks_width, self.chunks_height)
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered_count
    }

    pub fn is_discovered(&self, chunk: ChunkCoord) -> bool {
        chunk.x < self.chunks_width
            && chunk.y < self.chunks_height
            && self.discovered[chunk.y * self.chunks_width + chunk.x]
    }

    /// Chunk index containing a pixel position (may be outside the world)
    pub fn chunk_of(position: PixelPos) -> (i64, i64) {
        let chunk = CHUNK_SIZE as f64;
        (
            (position.x / TILE_SIZE / chunk).floor() as i64,
            (position.y / TILE_SIZE / chunk).floor() as i64,
        )
    }

    /// Mark the in-world, not yet discovered chunks of the 3x3 block around
    /// `position` as discovered and return them (row by row, left to right).
    pub fn discover(&mut self, position: PixelPos) -> Vec<ChunkCoord> {
        let mut fresh = Vec::new();
        if !position.x.is_finite() || !position.y.is_finite() {
            return fresh;
        }
        let (cx, cy) = Self::chunk_of(position);

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let (Some(x), Some(y)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                    continue;
                };
                if x < 0 || y < 0 || x as u64 >= self.chunks_width as u64 || y as u64 >= self.chunks_height as u64 {
                    continue;
                }

                let (x, y) = (x as usize, y as usize);
                let slot = &mut self.discovered[y * self.chunks_width + x];
                if *slot {
                    continue;
                }
                *slot = true;
                self.discovered_count += 1;
                fresh.push(ChunkCoord { x, y });
            }
        }

        fresh
    }

    /// Discover around `position` and collect the tiles of every newly
    /// discovered chunk. `None` when nothing new came into view.
    pub fn reveal(&mut self, grid: &WorldGrid, position: PixelPos) -> Option<ChunkReveal> {
        debug_assert_eq!((grid.width(), grid.height()), (self.world_width, self.world_height));

        let chunks = self.discover(position);
        let mut tiles = Vec::with_capacity(chunks.len() * CHUNK_SIZE * CHUNK_SIZE);
        for chunk in &chunks {
            collect_chunk(grid, *chunk, &mut tiles);
        }

        if tiles.is_empty() {
            return None;
        }
        Some(ChunkReveal { chunks, tiles })
    }
}

/// Append the cells of one chunk, clipped to the world, column by column
pub fn collect_chunk(grid: &WorldGrid, chunk: ChunkCoord, out: &mut Vec<Option<Tile>>) {
    let x0 = chunk.x * CHUNK_SIZE;
    let y0 = chunk.y * CHUNK_SIZE;
    let x1 = (x0 + CHUNK_SIZE).min(grid.width());
    let y1 = (y0 + CHUNK_SIZE).min(grid.height());
    if y0 >= y1 {
        return;
    }
    for x in x0..x1 {
        out.extend_from_slice(grid.column(x, y0..y1));
    }
}
