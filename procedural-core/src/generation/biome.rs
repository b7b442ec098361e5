//! Biome banding and per-biome tile selection.
//!
//! Biomes vary per horizontal band of 20-39 columns, not per tile. Each band
//! gets a random biome id; the terrain pass then jitters band edges with a
//! noise channel so boundaries are not perfectly vertical.

use rand::Rng;

use crate::constants::{BIOME_BAND_MAX, BIOME_BAND_MIN, BIOME_COUNT, DEEP_FILLER_DEPTH};
use crate::world::Tile;

// =====================================================
// Material & drop ids
// =====================================================

pub mod material {
    pub const GRASS: i32 = 0;
    pub const DIRT: i32 = 1;
    pub const SAND: i32 = 2;
    pub const SANDSTONE: i32 = 3;
    pub const SNOW: i32 = 4;
    pub const PERMAFROST: i32 = 5;
    pub const MOSS: i32 = 6;
    pub const STONE: i32 = 7;
}

pub mod drop {
    pub const NONE: i32 = 0;
    pub const SNOWBALL: i32 = 1;
    pub const SAND: i32 = 2;
    pub const STONE: i32 = 3;
}

/// Biome ids as stored in the biome map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biome {
    Plains,
    Tundra,
    Desert,
    Forest,
}

impl Biome {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Plains),
            1 => Some(Self::Tundra),
            2 => Some(Self::Desert),
            3 => Some(Self::Forest),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::Plains => 0,
            Self::Tundra => 1,
            Self::Desert => 2,
            Self::Forest => 3,
        }
    }
}

/// Material and drop for a solid cell at `row` in a column whose surface is
/// `surface`. Unknown biome ids fall back to plains surface material.
pub fn biome_tile(biome: u8, x: usize, row: i32, surface: i32) -> Tile {
    let is_surface = row == surface;
    let is_deep = row > surface + DEEP_FILLER_DEPTH;

    let (material, item_drop) = match Biome::from_id(biome) {
        Some(Biome::Plains) if is_surface => (material::GRASS, drop::NONE),
        Some(Biome::Forest) if is_surface => (material::MOSS, drop::NONE),
        Some(Biome::Plains | Biome::Forest) if is_deep => (material::STONE, drop::STONE),
        Some(Biome::Plains | Biome::Forest) => (material::DIRT, drop::NONE),
        Some(Biome::Tundra) if is_surface => (material::SNOW, drop::SNOWBALL),
        Some(Biome::Tundra) => (material::PERMAFROST, drop::SNOWBALL),
        Some(Biome::Desert) if is_surface => (material::SAND, drop::SAND),
        Some(Biome::Desert) => (material::SANDSTONE, drop::SAND),
        None => (material::GRASS, drop::NONE),
    };

    Tile::new(material, item_drop, x, row as usize)
}

// =====================================================
// Bands
// =====================================================

/// One contiguous run of columns sharing a biome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSpan {
    pub start: usize,
    /// Exclusive; clipped to the world width for the last band
    pub end: usize,
    pub biome: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomeBands {
    pub columns: Vec<u8>,
    pub spans: Vec<BandSpan>,
}

impl BiomeBands {
    /// Accumulate random-width bands until `width` columns are covered.
    /// Each band draws its width, then its biome id.
    pub fn generate<R: Rng>(width: usize, rng: &mut R) -> Self {
        let mut columns = vec![0u8; width];
        let mut spans = Vec::new();
        let mut accumulated = 0;

        while accumulated < width {
            let start = accumulated;
            let band_width = rng.gen_range(BIOME_BAND_MIN..BIOME_BAND_MAX);
            let biome = rng.gen_range(0..BIOME_COUNT);
            accumulated += band_width;

            let end = accumulated.min(width);
            columns[start..end].fill(biome);
            spans.push(BandSpan { start, end, biome });
        }

        Self { columns, spans }
    }

    /// Biome of the column at `index`, clamped into `[0, width)`
    pub fn at_clamped(&self, index: i64) -> u8 {
        let last = self.columns.len() as i64 - 1;
        self.columns[index.clamp(0, last) as usize]
    }
}
