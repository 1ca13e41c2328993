//! The `Simulator` collaborator: a lightweight deterministic stand-in for a
//! full city-builder tick.
//!
//! A bounded growth/decay model driven by the five policy levers plus a
//! chacha-seeded day RNG, with a plain `TickCounter` advancing once per
//! `step_once` call — no scheduling framework involved.

use rand::Rng;

use crate::config::SimConfig;
use crate::grid::Overlay;
use crate::sim_rng::SimRng;
use crate::world::{World, WorldStats};

pub struct Simulator {
    config: SimConfig,
    rng: SimRng,
    day: u64,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let rng = SimRng::from_seed_u64(config.seed);
        Self { config, rng, day: 0 }
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    /// Advances the world by one simulated day, mutating `money`/`population`/etc.
    /// in `world.stats()` based on current tile composition and policy levers.
    pub fn step_once(&mut self, world: &mut World) {
        self.day += 1;

        let mut residential = 0u32;
        let mut commercial = 0u32;
        let mut industrial = 0u32;
        let mut park = 0u32;
        let mut road = 0u32;

        for tile in world.tiles() {
            match tile.overlay {
                Overlay::Residential => residential += 1,
                Overlay::Commercial => commercial += 1,
                Overlay::Industrial => industrial += 1,
                Overlay::Park => park += 1,
                Overlay::Road => road += 1,
                _ => {}
            }
        }

        let tax_rate =
            (self.config.tax_residential + self.config.tax_commercial + self.config.tax_industrial) as f32 / 30.0;

        let jobs_capacity = commercial * 3 + industrial * 4;
        let population_capacity = residential * 4;

        let growth_noise = self.rng.0.gen_range(-0.02f32..0.02f32);
        let demand_residential = (1.0 - tax_rate * 0.3 + growth_noise).clamp(0.0, 2.0);

        let mut stats = world.stats();
        let target_population = (population_capacity as f32 * (0.6 + 0.4 * demand_residential)) as u32;
        if stats.population < target_population {
            stats.population += ((target_population - stats.population) / 20).max(1);
        } else if stats.population > target_population {
            stats.population -= ((stats.population - target_population) / 20).max(1);
        }

        stats.employed = stats.population.min(jobs_capacity);
        stats.jobs_capacity_accessible = jobs_capacity;
        stats.demand_residential = demand_residential;

        let income = (stats.population as i64 * tax_rate as i64).max(0)
            + (commercial as i64 * self.config.tax_commercial as i64)
            + (industrial as i64 * self.config.tax_industrial as i64);
        let expenses = (road as i64 * self.config.road_maintenance as i64)
            + (park as i64 * self.config.park_investment as i64);

        stats.income = income;
        stats.expenses = expenses;
        stats.money += income - expenses;

        let unemployment_rate = if stats.population > 0 {
            1.0 - stats.employed as f32 / stats.population as f32
        } else {
            0.0
        };
        let park_ratio = if residential > 0 {
            park as f32 / residential as f32
        } else {
            0.0
        };
        stats.happiness = (0.6 - unemployment_rate * 0.5 + park_ratio * 0.2).clamp(0.0, 1.0);

        stats.avg_land_value = 1.0 + park_ratio * 0.5 - tax_rate * 0.2;
        stats.traffic_congestion = (road as f32 / (world.width() * world.height()).max(1) as f32 * 2.0).min(1.0);
        stats.avg_commute_time = 5.0 + stats.traffic_congestion * 15.0;

        world.set_stats(stats);
    }

    /// Recomputes reported metrics without advancing the day counter, for
    /// callers that mutated tiles directly (e.g. `assign_districts_by_blocks`).
    pub fn refresh_derived_stats(&self, world: &mut World) {
        let mut stats = world.stats();
        let road_tiles = world
            .tiles()
            .iter()
            .filter(|t| t.overlay == Overlay::Road)
            .count() as f32;
        stats.traffic_congestion =
            (road_tiles / (world.width() * world.height()).max(1) as f32 * 2.0).min(1.0);
        world.set_stats(stats);
    }
}

pub fn apply_policy_to_config(config: &mut SimConfig, policy: &crate::policy_optimizer::PolicyCandidate) {
    config.tax_residential = policy.tax_residential;
    config.tax_commercial = policy.tax_commercial;
    config.tax_industrial = policy.tax_industrial;
    config.road_maintenance = policy.maintenance_road;
    config.park_investment = policy.maintenance_park;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_once_advances_day_counter() {
        let mut world = World::new(4, 4, 7);
        let mut sim = Simulator::new(SimConfig { seed: 7, width: 4, height: 4, ..Default::default() });
        sim.step_once(&mut world);
        assert_eq!(sim.day(), 1);
    }

    #[test]
    fn money_reflects_income_minus_expenses() {
        let mut world = World::new(3, 3, 1);
        world.at_mut(0, 0).overlay = Overlay::Commercial;
        let mut sim = Simulator::new(SimConfig { seed: 1, width: 3, height: 3, ..Default::default() });
        sim.step_once(&mut world);
        let stats: WorldStats = world.stats();
        assert_eq!(stats.money, stats.income - stats.expenses);
    }
}
