//! The tile grid (`World`) data model.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::grid::{Overlay, Terrain, Tile};

pub const MIN_HEIGHT: f32 = -1.0;
pub const MAX_HEIGHT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadApplyResult {
    Applied,
    InsufficientFunds,
    BlockedOccupied,
    BlockedWater,
}

/// Aggregate per-day metrics reported by the world/simulator collaborator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct WorldStats {
    pub money: i64,
    pub income: i64,
    pub expenses: i64,
    pub population: u32,
    pub employed: u32,
    pub happiness: f32,
    pub jobs_capacity_accessible: u32,
    pub demand_residential: f32,
    pub avg_land_value: f32,
    pub avg_commute_time: f32,
    pub traffic_congestion: f32,
}

/// A rectangular grid of tiles in row-major order (`index = y*width + x`).
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct World {
    width: usize,
    height: usize,
    seed: u64,
    tiles: Vec<Tile>,
    stats: WorldStats,
}

impl World {
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            tiles: vec![Tile::default(); width * height],
            stats: WorldStats::default(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut Tile {
        let idx = self.index(x, y);
        &mut self.tiles[idx]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    pub fn set_stats(&mut self, stats: WorldStats) {
        self.stats = stats;
    }

    /// Returns up to 4 cardinal neighbor coordinates in the fixed `{left, right, up, down}`
    /// order used throughout this crate for deterministic neighbor enumeration.
    pub fn neighbors4(&self, x: usize, y: usize) -> [Option<(usize, usize)>; 4] {
        let mut out = [None; 4];
        let (xi, yi) = (x as i64, y as i64);
        let cand = [(xi - 1, yi), (xi + 1, yi), (xi, yi - 1), (xi, yi + 1)];
        for (i, (nx, ny)) in cand.into_iter().enumerate() {
            if self.in_bounds(nx, ny) {
                out[i] = Some((nx as usize, ny as usize));
            }
        }
        out
    }

    /// Marks a tile as a road with the given level without touching money/stats.
    pub fn set_road(&mut self, x: usize, y: usize, level: u8) {
        let t = self.at_mut(x, y);
        t.overlay = Overlay::Road;
        t.level = level.clamp(1, 3);
    }

    /// Applies a road build/upgrade, validating overlay/bridge rules. Does not
    /// itself charge money; callers combine this with `road_placement_cost`
    /// and their own budget bookkeeping (see `bypass_planner::apply_road_resilience_bypass`).
    pub fn apply_road(&mut self, x: usize, y: usize, level: u8, allow_bridges: bool) -> RoadApplyResult {
        let t = *self.at(x, y);
        if t.terrain == Terrain::Water && !allow_bridges {
            return RoadApplyResult::BlockedWater;
        }
        if t.overlay != Overlay::Road && t.overlay != Overlay::None {
            return RoadApplyResult::BlockedOccupied;
        }
        self.set_road(x, y, level.max(t.road_level()));
        RoadApplyResult::Applied
    }

    /// No-op placeholder mirroring the collaborator contract's `recomputeRoadMasks`.
    /// This crate keeps no road-adjacency cache that needs to be rebuilt eagerly;
    /// derived structures (`CityBlocks`, `RoadGraph`, ...) are recomputed on demand.
    pub fn recompute_road_masks(&mut self) {}

    pub fn clamp_heights(&mut self) {
        for t in &mut self.tiles {
            t.height = t.height.clamp(MIN_HEIGHT, MAX_HEIGHT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check() {
        let w = World::new(4, 3, 1);
        assert!(w.in_bounds(0, 0));
        assert!(w.in_bounds(3, 2));
        assert!(!w.in_bounds(4, 0));
        assert!(!w.in_bounds(0, 3));
        assert!(!w.in_bounds(-1, 0));
    }

    #[test]
    fn neighbors4_order_and_edges() {
        let w = World::new(3, 3, 1);
        let ns = w.neighbors4(0, 0);
        assert_eq!(ns[0], None); // left
        assert_eq!(ns[1], Some((1, 0))); // right
        assert_eq!(ns[2], None); // up
        assert_eq!(ns[3], Some((0, 1))); // down
    }

    #[test]
    fn apply_road_blocked_on_water_without_bridges() {
        let mut w = World::new(2, 1, 1);
        w.at_mut(0, 0).terrain = Terrain::Water;
        assert_eq!(
            w.apply_road(0, 0, 1, false),
            RoadApplyResult::BlockedWater
        );
        assert_eq!(w.apply_road(0, 0, 1, true), RoadApplyResult::Applied);
    }

    #[test]
    fn apply_road_blocked_on_occupied_zone() {
        let mut w = World::new(1, 1, 1);
        w.at_mut(0, 0).overlay = Overlay::Residential;
        assert_eq!(
            w.apply_road(0, 0, 1, false),
            RoadApplyResult::BlockedOccupied
        );
    }
}
