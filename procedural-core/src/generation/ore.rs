//! Ore deposit descriptors.

use super::automaton::{AutomatonRule, BoolGrid};

/// Generation-time description of one ore kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ore {
    pub name: &'static str,
    pub birth_count: u32,
    pub death_count: u32,
    /// Probability that a cell starts as a deposit seed
    pub initial_chance: f64,
    pub material_id: i32,
    pub item_drop_id: i32,
}

impl Ore {
    /// Single-step rule shaping this ore's deposits. Ore grids never treat
    /// the edge as alive.
    pub fn rule(&self) -> AutomatonRule {
        AutomatonRule {
            death_limit: self.death_count,
            birth_limit: self.birth_count,
            edge_alive: false,
        }
    }
}

/// Fixed ore table. When several ore grids claim a cell the later entry wins.
pub const ORES: [Ore; 5] = [
    Ore {
        name: "coal",
        birth_count: 1,
        death_count: 0,
        initial_chance: 0.005,
        material_id: 8,
        item_drop_id: 16,
    },
    Ore {
        name: "copper",
        birth_count: 1,
        death_count: 0,
        initial_chance: 0.0075,
        material_id: 10,
        item_drop_id: 18,
    },
    Ore {
        name: "iron",
        birth_count: 2,
        death_count: 2,
        initial_chance: 0.015,
        material_id: 9,
        item_drop_id: 17,
    },
    Ore {
        name: "silver",
        birth_count: 2,
        death_count: 2,
        initial_chance: 0.0125,
        material_id: 11,
        item_drop_id: 19,
    },
    Ore {
        name: "gold",
        birth_count: 2,
        death_count: 2,
        initial_chance: 0.005,
        material_id: 12,
        item_drop_id: 20,
    },
];

/// Ore deposited at `(x, y)` of the ore grids, which pair with [`ORES`] by
/// index. When several grids claim the cell the later entry wins.
pub fn ore_at(grids: &[BoolGrid], x: i64, y: i64) -> Option<&'static Ore> {
    ORES.iter()
        .zip(grids)
        .rev()
        .find(|(_, grid)| grid.try_get(x, y) == Some(true))
        .map(|(ore, _)| ore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ore_materials_distinct() {
        let materials: HashSet<i32> = ORES.iter().map(|o| o.material_id).collect();
        let drops: HashSet<i32> = ORES.iter().map(|o| o.item_drop_id).collect();
        assert_eq!(materials.len(), ORES.len());
        assert_eq!(drops.len(), ORES.len());
    }

    #[test]
    fn test_ore_rule_ignores_edges() {
        assert!(ORES.iter().all(|o| !o.rule().edge_alive));
        let rule = ORES[2].rule();
        assert_eq!((rule.birth_limit, rule.death_limit), (2, 2));
    }

    fn grids_with(claims: &[(usize, usize, usize)]) -> Vec<BoolGrid> {
        let mut grids: Vec<BoolGrid> = ORES.iter().map(|_| BoolGrid::new(4, 4)).collect();
        for &(ore, x, y) in claims {
            grids[ore].set(x, y, true);
        }
        grids
    }

    #[test]
    fn test_later_ore_wins_overlap() {
        let grids = grids_with(&[(0, 1, 1), (3, 1, 1), (2, 1, 1)]);
        assert_eq!(ore_at(&grids, 1, 1).map(|o| o.name), Some("silver"));
    }

    #[test]
    fn test_single_claim_and_empty_cell() {
        let grids = grids_with(&[(0, 2, 3)]);
        assert_eq!(ore_at(&grids, 2, 3).map(|o| o.material_id), Some(8));
        assert!(ore_at(&grids, 0, 0).is_none());
    }

    #[test]
    fn test_reads_past_grid_are_dead() {
        let grids = grids_with(&[(4, 3, 3)]);
        assert!(ore_at(&grids, 3, 4).is_none());
        assert!(ore_at(&grids, -1, 0).is_none());
        assert!(ore_at(&[], 3, 3).is_none());
    }
}
