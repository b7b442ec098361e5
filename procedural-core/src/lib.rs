//! Tile World - Procedural Core Library
//!
//! Deterministic, synchronous building blocks of the tile world server:
//! - World grid data model (tiles, biome map, height map)
//! - Procedural generation (Perlin noise channels, cellular-automaton caves
//!   and ore deposits, biome banding)
//! - Per-client chunk visibility tracking
//! - Shared constants and tracing setup

pub mod constants;
pub mod generation;
pub mod logging;
pub mod visibility;
pub mod world;

pub use generation::{generate_world, GeneratorConfig, TerrainGenerator};
pub use visibility::{ChunkCoord, ChunkReveal, VisibilityTracker};
pub use world::{PixelPos, Tile, TilePos, WorldError, WorldGrid};
