//! Boolean cellular automaton used for cave carving and ore deposits.
//!
//! One relaxation step counts the 8 neighbours of every cell and applies a
//! birth/death threshold. Steps never mutate their input; each produces a
//! fresh grid, so columns are computed in parallel without changing results.

use rand::Rng;
use rayon::prelude::*;

/// Birth/death thresholds for one automaton run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomatonRule {
    /// Cells with fewer alive neighbours than this die
    pub death_limit: u32,
    /// Cells with at least this many alive neighbours are born
    pub birth_limit: u32,
    /// Whether neighbours outside the grid count as alive
    pub edge_alive: bool,
}

impl AutomatonRule {
    /// Next state of a cell given its current state and alive neighbour count.
    /// Death is applied after birth, so it wins when both thresholds match.
    #[inline]
    pub fn apply(&self, alive: bool, neighbours: u32) -> bool {
        let mut next = alive;
        if neighbours >= self.birth_limit {
            next = true;
        }
        if neighbours < self.death_limit {
            next = false;
        }
        next
    }
}

/// Dense boolean grid, stored column-major like `WorldGrid`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl BoolGrid {
    /// All-dead grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Grid whose rows `0..seeded_rows` start alive with probability `chance`.
    /// Draws one random number per seeded cell, columns outer, rows inner.
    pub fn seeded<R: Rng>(
        width: usize,
        height: usize,
        seeded_rows: usize,
        chance: f64,
        rng: &mut R,
    ) -> Self {
        let mut grid = Self::new(width, height);
        let rows = seeded_rows.min(height);
        for x in 0..width {
            for y in 0..rows {
                grid.cells[x * height + y] = rng.gen::<f64>() < chance;
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell state; panics when out of range
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        self.cells[x * self.height + y]
    }

    /// Cell state, `None` when out of range
    pub fn try_get(&self, x: i64, y: i64) -> Option<bool> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.cells[x as usize * self.height + y as usize])
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        self.cells[x * self.height + y] = alive;
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Alive 8-neighbours of `(x, y)`; out-of-range neighbours count as alive
    /// iff `edge_alive`.
    pub fn alive_neighbours(&self, x: usize, y: usize, edge_alive: bool) -> u32 {
        NEIGHBOURS
            .iter()
            .filter(|(dx, dy)| {
                self.try_get(x as i64 + dx, y as i64 + dy)
                    .unwrap_or(edge_alive)
            })
            .count() as u32
    }

    /// One relaxation step
    pub fn step(&self, rule: AutomatonRule) -> BoolGrid {
        let mut next = vec![false; self.cells.len()];
        if self.height > 0 {
            next.par_chunks_mut(self.height)
                .enumerate()
                .for_each(|(x, column)| {
                    for (y, cell) in column.iter_mut().enumerate() {
                        let neighbours = self.alive_neighbours(x, y, rule.edge_alive);
                        *cell = rule.apply(self.get(x, y), neighbours);
                    }
                });
        }
        BoolGrid {
            width: self.width,
            height: self.height,
            cells: next,
        }
    }

    /// `steps` relaxation steps in sequence
    pub fn relax(self, rule: AutomatonRule, steps: usize) -> BoolGrid {
        (0..steps).fold(self, |grid, _| grid.step(rule))
    }
}
