//! Stormwater pollution routing over the hydrology flow field.
//!
//! Per-tile local load from overlay/level weights, height-descending routing
//! with retention, and a dilution exponent applied to flow accumulation.

use crate::config::RunoffPollutionConfig;
use crate::grid::{Overlay, Terrain};
use crate::hydrology::HydrologyField;
use crate::world::World;

const CLAMP_LOAD: f32 = 10.0;
const DEFAULT_TRAFFIC: f32 = 0.3;

#[derive(Debug, Clone, Default)]
pub struct RunoffPollutionResult {
    pub pollution01: Vec<f32>,
    pub residential_exposure_avg: f32,
    pub high_exposure_share: f32,
}

fn overlay_load_weight(overlay: Overlay, level: u8) -> f32 {
    let base = match overlay {
        Overlay::Industrial => 1.0,
        Overlay::Commercial => 0.6,
        Overlay::Residential => 0.35,
        Overlay::Road => 0.2,
        Overlay::Park | Overlay::None => 0.05,
        _ => 0.15,
    };
    base * (1.0 + 0.25 * (level.saturating_sub(1)) as f32)
}

fn terrain_filtration(terrain: Terrain) -> f32 {
    match terrain {
        Terrain::Water => 0.0,
        Terrain::Sand => 0.25,
        Terrain::Grass => 0.1,
    }
}

fn overlay_filtration(overlay: Overlay, config: &RunoffPollutionConfig) -> f32 {
    match overlay {
        Overlay::Park => config.filtration_park,
        _ => config.retention_base,
    }
}

pub fn compute_local_load(world: &World, traffic: Option<&[f32]>, config: &RunoffPollutionConfig) -> Vec<f32> {
    let n = world.width() * world.height();
    let mut load = vec![0.0f32; n];
    for y in 0..world.height() {
        for x in 0..world.width() {
            let idx = world.index(x, y);
            let tile = world.at(x, y);
            let traffic_component = traffic.map(|t| t[idx]).unwrap_or(DEFAULT_TRAFFIC);
            let l = overlay_load_weight(tile.overlay, tile.level) + config.traffic_weight * traffic_component;
            load[idx] = l.clamp(0.0, CLAMP_LOAD);
        }
    }
    load
}

struct ForwardPass {
    mass_total: Vec<f32>,
    retain: Vec<f32>,
    concentration: Vec<f32>,
}

fn forward_route(world: &World, field: &HydrologyField, local_load: &[f32], config: &RunoffPollutionConfig) -> ForwardPass {
    let n = world.width() * world.height();
    let mut mass_in = vec![0.0f32; n];
    let mut mass_total = vec![0.0f32; n];
    let mut retain = vec![0.0f32; n];
    let mut concentration = vec![0.0f32; n];

    let mut order: Vec<usize> = (0..n).collect();
    let heights: Vec<f32> = (0..n)
        .map(|i| world.at(i % world.width(), i / world.width()).height)
        .collect();
    order.sort_by(|&a, &b| {
        heights[b]
            .partial_cmp(&heights[a])
            .unwrap()
            .then_with(|| a.cmp(&b))
    });

    for &u in &order {
        let tile = world.at(u % world.width(), u / world.width());
        let r = overlay_filtration(tile.overlay, config) + terrain_filtration(tile.terrain);
        let r = if tile.terrain == Terrain::Water { 1.0 } else { r.clamp(0.0, 1.0) };
        retain[u] = r;

        let total = local_load[u] + mass_in[u];
        mass_total[u] = total;
        let outflow = total * (1.0 - r);
        let denom = (field.accum[u].max(1) as f32).powf(config.dilution_exponent);
        concentration[u] = outflow / denom;

        let d = field.dir[u];
        if d >= 0 {
            mass_in[d as usize] += outflow;
        }
    }

    ForwardPass { mass_total, retain, concentration }
}

pub fn compute_runoff_pollution(
    world: &World,
    field: &HydrologyField,
    traffic: Option<&[f32]>,
    config: &RunoffPollutionConfig,
) -> RunoffPollutionResult {
    let local_load = compute_local_load(world, traffic, config);
    let forward = forward_route(world, field, &local_load, config);

    let max_conc = forward.concentration.iter().cloned().fold(0.0f32, f32::max).max(1e-9);
    let pollution01: Vec<f32> = forward.concentration.iter().map(|&c| c / max_conc).collect();

    let mut weighted_sum = 0.0f64;
    let mut total_occupants = 0.0f64;
    let mut high_exposure_occupants = 0.0f64;

    for y in 0..world.height() {
        for x in 0..world.width() {
            let tile = world.at(x, y);
            if tile.overlay == Overlay::Residential {
                let idx = world.index(x, y);
                let occ = tile.occupants as f64;
                weighted_sum += occ * pollution01[idx] as f64;
                total_occupants += occ;
                if pollution01[idx] > config.high_exposure_threshold01 {
                    high_exposure_occupants += occ;
                }
            }
        }
    }

    let residential_exposure_avg = if total_occupants > 0.0 {
        (weighted_sum / total_occupants) as f32
    } else {
        0.0
    };
    let high_exposure_share = if total_occupants > 0.0 {
        (high_exposure_occupants / total_occupants) as f32
    } else {
        0.0
    };

    RunoffPollutionResult {
        pollution01,
        residential_exposure_avg,
        high_exposure_share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::build_hydrology_field;

    #[test]
    fn flat_world_has_uniform_low_pollution() {
        let world = World::new(3, 3, 1);
        let heights: Vec<f32> = (0..9).map(|_| 0.0).collect();
        let hydro_config = crate::config::HydrologyConfig::default();
        let field = build_hydrology_field(&heights, 3, 3, &hydro_config);
        let config = RunoffPollutionConfig::default();
        let result = compute_runoff_pollution(&world, &field, None, &config);
        assert_eq!(result.pollution01.len(), 9);
    }

    #[test]
    fn residential_exposure_zero_with_no_residents() {
        let world = World::new(2, 2, 1);
        let heights = vec![1.0, 0.5, 0.5, 0.0];
        let hydro_config = crate::config::HydrologyConfig::default();
        let field = build_hydrology_field(&heights, 2, 2, &hydro_config);
        let config = RunoffPollutionConfig::default();
        let result = compute_runoff_pollution(&world, &field, None, &config);
        assert_eq!(result.residential_exposure_avg, 0.0);
    }
}
