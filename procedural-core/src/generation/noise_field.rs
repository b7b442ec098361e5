//! Seeded Perlin noise channel with fractal octaves.

use noise::{NoiseFn, Perlin};

/// One independent noise channel. Terrain uses a separate channel (seed)
/// per purpose so height, mountains, biome edges and cave depth are
/// uncorrelated.
#[derive(Clone)]
pub struct NoiseField {
    perlin: Perlin,
    seed: u32,
    persistence: f64,
    lacunarity: f64,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Fractal sum of `octaves` Perlin layers, normalised back into [-1, 1].
    /// Pure: identical (seed, x, y, octaves) always gives the same value.
    pub fn sample(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        let mut max_value = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        total / max_value
    }
}
