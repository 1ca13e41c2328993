//! Plain-data configuration structs, one per analysis module.
//!
//! Module-local constants collected into small structs with numeric
//! `Default` impls, loaded from JSON via `serde` rather than hand-parsed. No
//! builder pattern, no env overrides.

use serde::{Deserialize, Serialize};

/// Number of districts a `BlockDistricting` pass assigns, matching
/// `Tile::district`'s `0..8` range.
pub const DISTRICT_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HydrologyConfig {
    pub river_min_accum_floor: u32,
    pub river_min_accum_divisor: u32,
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            river_min_accum_floor: 32,
            river_min_accum_divisor: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContoursConfig {
    pub simplify_epsilon: f64,
}

impl Default for ContoursConfig {
    fn default() -> Self {
        Self {
            simplify_epsilon: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErosionConfig {
    pub thermal_talus: f32,
    pub thermal_rate: f32,
    pub thermal_iterations: u32,
    pub river_carve_depth: f32,
    pub river_carve_power: f32,
    pub smoothing_iterations: u32,
    pub smooth_rate: f32,
    pub quantize_scale: f32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            thermal_talus: 0.12,
            thermal_rate: 0.5,
            thermal_iterations: 4,
            river_carve_depth: 0.35,
            river_carve_power: 0.60,
            smoothing_iterations: 1,
            smooth_rate: 0.25,
            quantize_scale: 4096.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunoffPollutionConfig {
    pub retention_base: f32,
    pub filtration_park: f32,
    pub dilution_exponent: f32,
    pub traffic_weight: f32,
    pub high_exposure_threshold01: f32,
}

impl Default for RunoffPollutionConfig {
    fn default() -> Self {
        Self {
            retention_base: 0.15,
            filtration_park: 0.55,
            dilution_exponent: 0.5,
            traffic_weight: 0.35,
            high_exposure_threshold01: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoadHealthConfig {
    pub max_sources: usize,
    pub auto_exact_max_nodes: usize,
    pub auto_sample_sources: usize,
    pub include_node_centrality: bool,
    pub articulation_vulnerability_base: f32,
    pub include_bypass: bool,
}

impl Default for RoadHealthConfig {
    fn default() -> Self {
        Self {
            max_sources: 0,
            auto_exact_max_nodes: 650,
            auto_sample_sources: 256,
            include_node_centrality: true,
            articulation_vulnerability_base: 0.70,
            include_bypass: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BypassPlannerConfig {
    pub top: usize,
    pub money_objective: bool,
    pub target_level: u8,
    pub allow_bridges: bool,
    pub max_primary_cost: i64,
    pub max_nodes_per_side: usize,
    pub rank_by_traffic: bool,
}

impl Default for BypassPlannerConfig {
    fn default() -> Self {
        Self {
            top: 5,
            money_objective: true,
            target_level: 1,
            allow_bridges: false,
            max_primary_cost: 0,
            max_nodes_per_side: 256,
            rank_by_traffic: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicyOptimizerConfig {
    pub population: usize,
    pub elites: usize,
    pub generations: usize,
    /// Per-sample probability of drawing uniformly from the range instead of
    /// the fitted Gaussian, so CEM never fully collapses onto a local optimum.
    pub explore_prob: f64,
    pub std_decay: f64,
    pub score_epsilon: f64,
    /// Worker thread count for batch evaluation; 0 means "use available parallelism".
    pub workers: usize,
}

impl Default for PolicyOptimizerConfig {
    fn default() -> Self {
        Self {
            population: 32,
            elites: 6,
            generations: 12,
            explore_prob: 0.10,
            std_decay: 0.85,
            score_epsilon: 1e-9,
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub tax_residential: i32,
    pub tax_commercial: i32,
    pub tax_industrial: i32,
    pub park_investment: i32,
    pub road_maintenance: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            seed: 1,
            tax_residential: 9,
            tax_commercial: 9,
            tax_industrial: 9,
            park_investment: 5,
            road_maintenance: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        assert_eq!(HydrologyConfig::default().river_min_accum_floor, 32);
        assert_eq!(DISTRICT_COUNT, 8);
        assert!(PolicyOptimizerConfig::default().elites < PolicyOptimizerConfig::default().population);
    }
}
