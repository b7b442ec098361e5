//! Terrain generation.
//!
//! Produces the finished [`WorldGrid`] from `(width, height, seed)` in one
//! synchronous pass:
//!
//! ```text
//! seed ─► Xoshiro256++ ─┬─► 4 noise channel seeds
//!                       ├─► cave grid (rows 0..h/2 seeded, 20 relaxation steps)
//!                       ├─► 5 ore grids (one relaxation step each)
//!                       └─► biome bands
//! per column: surface row = ceil(max(flats, mountains))
//! per cell below surface: cave carve ─► ore ─► biome material
//! ```
//!
//! Every random draw comes from the single seeded RNG, so identical inputs
//! reproduce a bit-identical world.

pub mod automaton;
pub mod biome;
pub mod noise_field;
pub mod ore;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::constants::*;
use crate::world::{Tile, WorldError, WorldGrid};
use automaton::{AutomatonRule, BoolGrid};
use biome::{biome_tile, BiomeBands};
use noise_field::NoiseField;
use ore::{ore_at, ORES};

/// Inputs to world generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 1750,
            height: 900,
            seed: 42,
        }
    }
}

/// Seeds of the four independent noise channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseSeeds {
    pub height: u32,
    pub mountain: u32,
    pub biome_edge: u32,
    pub depth: u32,
}

impl NoiseSeeds {
    fn draw<R: Rng>(rng: &mut R) -> Self {
        let mut next = || (rng.gen::<f64>() * 1000.0).ceil() as u32;
        Self {
            height: next(),
            mountain: next(),
            biome_edge: next(),
            depth: next(),
        }
    }
}

/// Intermediate automaton output, discarded once tiles are placed
struct Carving {
    /// Alive cells keep their rock; dead cells are carved out below the cave depth
    caves: BoolGrid,
    ores: Vec<BoolGrid>,
}

pub struct TerrainGenerator {
    config: GeneratorConfig,
    rng: Xoshiro256PlusPlus,
}

impl TerrainGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
        }
    }

    /// Run the full pipeline. Consumes the generator: its RNG stream is
    /// only meaningful for one world.
    pub fn generate(mut self) -> Result<WorldGrid, WorldError> {
        let GeneratorConfig { width, height, seed } = self.config;
        let mut grid = WorldGrid::empty(width, height)?;

        let start = Instant::now();
        info!(width, height, seed, "Start generation");

        let seeds = NoiseSeeds::draw(&mut self.rng);
        debug!(?seeds, "Noise channels seeded");

        let carving = self.carve();
        let bands = BiomeBands::generate(width, &mut self.rng);
        debug!(bands = bands.spans.len(), "Biome bands assigned");

        self.place_tiles(&mut grid, &seeds, &carving, &bands);

        info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            digest = %grid.digest_hex(),
            "Finished generation"
        );
        Ok(grid)
    }

    /// Seed caves, seed and shape every ore grid, then relax the caves
    fn carve(&mut self) -> Carving {
        let GeneratorConfig { width, height, .. } = self.config;
        let half = height / 2;

        let caves = BoolGrid::seeded(width, height, half, CAVE_INITIAL_CHANCE, &mut self.rng);

        let ores: Vec<BoolGrid> = ORES
            .iter()
            .map(|ore| {
                BoolGrid::seeded(width, half, half, ore.initial_chance, &mut self.rng)
                    .step(ore.rule())
            })
            .collect();

        let caves = caves.relax(
            AutomatonRule {
                death_limit: CAVE_DEATH_LIMIT,
                birth_limit: CAVE_BIRTH_LIMIT,
                edge_alive: true,
            },
            CAVE_STEPS,
        );

        debug!(
            solid_cave_cells = caves.alive_count(),
            ore_cells = ores.iter().map(BoolGrid::alive_count).sum::<usize>(),
            "Caves and ores carved"
        );

        Carving { caves, ores }
    }

    fn place_tiles(
        &self,
        grid: &mut WorldGrid,
        seeds: &NoiseSeeds,
        carving: &Carving,
        bands: &BiomeBands,
    ) {
        let GeneratorConfig { width, height, .. } = self.config;
        let half = height / 2;

        let height_noise = NoiseField::new(seeds.height);
        let mountain_noise = NoiseField::new(seeds.mountain);
        let edge_noise = NoiseField::new(seeds.biome_edge);
        let depth_noise = NoiseField::new(seeds.depth);

        // Edge jitter only depends on the row
        let edge_offsets: Vec<i64> = (0..height)
            .map(|y| {
                (edge_noise.sample(y as f64 / BIOME_EDGE_SCALE, 0.0, 1) * BIOME_EDGE_AMPLITUDE)
                    .floor() as i64
            })
            .collect();

        for x in 0..width {
            let surface = surface_row(&height_noise, &mountain_noise, x, half);
            grid.set_surface(x, surface);

            let depth_edge = (depth_noise.sample(x as f64 / DEPTH_EDGE_SCALE, 0.0, TERRAIN_OCTAVES)
                * DEPTH_EDGE_AMPLITUDE)
                .ceil() as i32;

            for y in 0..height {
                let biome = bands.at_clamped(x as i64 + edge_offsets[y]);
                grid.set_biome(x, y, biome);

                let row = y as i32;
                if row < surface {
                    continue;
                }

                let lower = y > half;
                if lower
                    && !carving.caves.get(x, y - half)
                    && row > surface + CAVE_DEPTH + depth_edge
                {
                    continue;
                }

                let mut tile = None;
                if lower && row > surface + ORE_DEPTH + depth_edge {
                    tile = ore_at(&carving.ores, x as i64, (y - half) as i64)
                        .map(|ore| Tile::new(ore.material_id, ore.item_drop_id, x, y));
                }

                let tile = tile.unwrap_or_else(|| biome_tile(biome, x, row, surface));
                grid.put(x, y, Some(tile));
            }
        }
    }
}

/// Topmost solid row of column `x`
fn surface_row(height_noise: &NoiseField, mountain_noise: &NoiseField, x: usize, half: usize) -> i32 {
    let x = x as f64;
    let half = half as f64;
    let flats = half - FLATS_BASE_OFFSET
        + height_noise.sample(x / FLATS_SCALE, 0.0, TERRAIN_OCTAVES) * FLATS_AMPLITUDE;
    let mountains = half - MOUNTAIN_BASE_OFFSET
        + mountain_noise.sample(x / MOUNTAIN_SCALE, 0.0, TERRAIN_OCTAVES) * MOUNTAIN_AMPLITUDE;
    flats.max(mountains).ceil() as i32
}

/// Generate a world in one call
pub fn generate_world(width: usize, height: usize, seed: u64) -> Result<WorldGrid, WorldError> {
    TerrainGenerator::new(GeneratorConfig { width, height, seed }).generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_generation() {
        let a = generate_world(200, 120, 12345).unwrap();
        let b = generate_world(200, 120, 12345).unwrap();
        assert_eq!(a, b, "Same seed must produce the same world");
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_world(200, 120, 1).unwrap();
        let b = generate_world(200, 120, 2).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            generate_world(0, 100, 1),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_nothing_above_surface() {
        let world = generate_world(300, 200, 7).unwrap();
        for x in 0..world.width() {
            let surface = world.height_map()[x];
            for y in 0..world.height() {
                if (y as i32) < surface {
                    assert_eq!(world.tile(x, y), None, "air expected at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_surface_row_is_solid() {
        let world = generate_world(300, 200, 9).unwrap();
        for x in 0..world.width() {
            let surface = world.height_map()[x];
            if surface >= 0 && (surface as usize) < world.height() {
                assert!(world.tile(x, surface as usize).is_some(), "surface missing at column {x}");
            }
        }
    }

    #[test]
    fn test_biomes_in_range() {
        let world = generate_world(150, 100, 3).unwrap();
        for x in 0..world.width() {
            for y in 0..world.height() {
                assert!(world.biome(x, y) < BIOME_COUNT);
            }
        }
    }

    #[test]
    fn test_tiles_know_their_cell() {
        let world = generate_world(120, 80, 5).unwrap();
        for x in 0..world.width() {
            for y in 0..world.height() {
                if let Some(tile) = world.tile(x, y) {
                    assert_eq!((tile.position.x, tile.position.y), (x as i32, y as i32));
                }
            }
        }
    }

    #[test]
    fn test_ore_only_deep_in_lower_half() {
        let world = generate_world(400, 300, 21).unwrap();
        let ore_materials: Vec<i32> = ORES.iter().map(|o| o.material_id).collect();
        for x in 0..world.width() {
            let surface = world.height_map()[x];
            for y in 0..world.height() {
                if let Some(tile) = world.tile(x, y) {
                    if ore_materials.contains(&tile.material_id) {
                        assert!(y > world.height() / 2);
                        // depth jitter is at most +-10 rows
                        assert!(y as i32 > surface + ORE_DEPTH - 11);
                    }
                }
            }
        }
    }

    #[test]
    fn test_caves_and_ores_present() {
        let world = generate_world(400, 300, 21).unwrap();
        let half = world.height() / 2;
        let ore_materials: Vec<i32> = ORES.iter().map(|o| o.material_id).collect();
        let mut ores = 0;
        let mut carved = 0;
        for x in 0..world.width() {
            let surface = world.height_map()[x];
            for y in 0..world.height() {
                if (y as i32) < surface {
                    continue;
                }
                match world.tile(x, y) {
                    Some(tile) if ore_materials.contains(&tile.material_id) => ores += 1,
                    Some(_) => {}
                    None => {
                        // depth jitter is at most +-10 rows
                        assert!(y > half, "carved cell ({x}, {y}) in upper half");
                        assert!(y as i32 > surface + CAVE_DEPTH - 11);
                        carved += 1;
                    }
                }
            }
        }
        assert!(ores > 0, "no ore placed");
        assert!(carved > 0, "no cave carved");
    }

    #[test]
    fn test_seeds_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        for _ in 0..100 {
            let seeds = NoiseSeeds::draw(&mut rng);
            for s in [seeds.height, seeds.mountain, seeds.biome_edge, seeds.depth] {
                assert!(s <= 1000);
            }
        }
    }
}
