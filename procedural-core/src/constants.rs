//! Centralized world constants for the tile world core.
//!
//! Eliminates magic numbers shared between the generator, the visibility
//! tracker and the server. Material and drop ids live in `generation::biome`
//! and `generation::ore` next to the rules that use them.

// =====================================================
// Geometry
// =====================================================

/// Edge length of one tile in pixels (client positions are in pixels)
pub const TILE_SIZE: f64 = 40.0;

/// Edge length of one visibility chunk in tiles
pub const CHUNK_SIZE: usize = 50;

/// Vertical pixel offset applied to the spawn tile so the avatar starts above ground
pub const SPAWN_HEIGHT_OFFSET: f64 = 90.0;

// =====================================================
// Terrain shape
// =====================================================

/// Horizontal scale of the rolling "flats" height channel
pub const FLATS_SCALE: f64 = 400.0;

/// Flats sit this many rows above the world midline
pub const FLATS_BASE_OFFSET: f64 = 20.0;

/// Flats amplitude in rows
pub const FLATS_AMPLITUDE: f64 = 20.0;

/// Horizontal scale of the mountain height channel
pub const MOUNTAIN_SCALE: f64 = 100.0;

/// Mountains sit this many rows above the world midline
pub const MOUNTAIN_BASE_OFFSET: f64 = 40.0;

/// Mountain amplitude in rows
pub const MOUNTAIN_AMPLITUDE: f64 = 60.0;

/// Octaves used by the height, mountain and depth channels
pub const TERRAIN_OCTAVES: u32 = 5;

/// Vertical scale of the biome edge jitter channel
pub const BIOME_EDGE_SCALE: f64 = 400.0;

/// Maximum horizontal biome edge displacement in columns
pub const BIOME_EDGE_AMPLITUDE: f64 = 40.0;

/// Horizontal scale of the cave/ore depth jitter channel
pub const DEPTH_EDGE_SCALE: f64 = 400.0;

/// Depth jitter amplitude in rows
pub const DEPTH_EDGE_AMPLITUDE: f64 = 10.0;

/// Caves only open this many rows (plus jitter) below the surface
pub const CAVE_DEPTH: i32 = 20;

/// Ore only appears this many rows (plus jitter) below the surface
pub const ORE_DEPTH: i32 = 30;

// =====================================================
// Caves
// =====================================================

/// Probability that a cave cell starts alive (solid)
pub const CAVE_INITIAL_CHANCE: f64 = 0.525;

/// Relaxation steps applied to the cave grid
pub const CAVE_STEPS: usize = 20;

/// Cave cells with fewer alive neighbours die
pub const CAVE_DEATH_LIMIT: u32 = 4;

/// Cave cells with at least this many alive neighbours are born
pub const CAVE_BIRTH_LIMIT: u32 = 5;

// =====================================================
// Biomes
// =====================================================

/// Number of distinct biome ids (ids are `0..BIOME_COUNT`)
pub const BIOME_COUNT: u8 = 4;

/// Minimum biome band width in columns (inclusive)
pub const BIOME_BAND_MIN: usize = 20;

/// Maximum biome band width in columns (exclusive)
pub const BIOME_BAND_MAX: usize = 40;

/// Rows below the surface after which deep filler replaces subsurface material
pub const DEEP_FILLER_DEPTH: i32 = 20;
