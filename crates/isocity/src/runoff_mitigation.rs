//! Greedy park placement guided by an adjoint sensitivity of runoff pollution.
//!
//! A reverse-order (height-ascending) adjoint pass estimates first-order
//! benefit per candidate tile, then the actual placement is validated by
//! re-running the exact forward pass so the reported objective reduction is
//! never linearized.

use crate::config::RunoffPollutionConfig;
use crate::grid::{Overlay, Terrain};
use crate::hydrology::HydrologyField;
use crate::runoff_pollution::compute_runoff_pollution;
use crate::world::World;

#[derive(Debug, Clone, Copy)]
pub struct RunoffMitigationConfig {
    pub parks_to_add: u32,
    pub min_separation: i64,
    pub include_roads: bool,
    pub include_zones: bool,
    pub include_water: bool,
}

impl Default for RunoffMitigationConfig {
    fn default() -> Self {
        Self {
            parks_to_add: 8,
            min_separation: 2,
            include_roads: false,
            include_zones: false,
            include_water: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandWeightMode {
    ResidentialOccupantsOnly,
    AllOccupants,
    ResidentialIndicator,
    AnyZoneIndicator,
}

fn demand_weight(tile: &crate::grid::Tile, mode: DemandWeightMode) -> f32 {
    match mode {
        DemandWeightMode::ResidentialOccupantsOnly => {
            if tile.overlay == Overlay::Residential {
                tile.occupants as f32
            } else {
                0.0
            }
        }
        DemandWeightMode::AllOccupants => tile.occupants as f32,
        DemandWeightMode::ResidentialIndicator => {
            if tile.overlay == Overlay::Residential {
                1.0
            } else {
                0.0
            }
        }
        DemandWeightMode::AnyZoneIndicator => {
            if tile.overlay.is_zone() {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn is_candidate(world: &World, x: usize, y: usize, config: &RunoffMitigationConfig) -> bool {
    let tile = world.at(x, y);
    if tile.overlay == Overlay::Park {
        return false;
    }
    if tile.terrain == Terrain::Water && !config.include_water {
        return false;
    }
    if tile.overlay == Overlay::Road && !config.include_roads {
        return false;
    }
    if tile.overlay.is_zone() && !config.include_zones {
        return false;
    }
    true
}

fn current_retention(world: &World, x: usize, y: usize, pollution_config: &RunoffPollutionConfig) -> f32 {
    let tile = world.at(x, y);
    if tile.terrain == Terrain::Water {
        return 1.0;
    }
    let base = match tile.overlay {
        Overlay::Park => pollution_config.filtration_park,
        _ => pollution_config.retention_base,
    };
    let terrain_add = match tile.terrain {
        Terrain::Sand => 0.25,
        Terrain::Grass => 0.1,
        Terrain::Water => 0.0,
    };
    (base + terrain_add).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct MitigationPlan {
    pub selected_tiles: Vec<usize>,
    pub objective_before: f32,
    pub objective_after: f32,
}

fn adjoint_pass(
    world: &World,
    field: &HydrologyField,
    mass_total: &[f32],
    retain: &[f32],
    mode: DemandWeightMode,
) -> Vec<f32> {
    let n = world.width() * world.height();
    let mut adj_out = vec![0.0f32; n];

    let mut order: Vec<usize> = (0..n).collect();
    let heights: Vec<f32> = (0..n)
        .map(|i| world.at(i % world.width(), i / world.width()).height)
        .collect();
    order.sort_by(|&a, &b| {
        heights[a]
            .partial_cmp(&heights[b])
            .unwrap()
            .then_with(|| a.cmp(&b))
    });

    for &i in &order {
        let (x, y) = (i % world.width(), i / world.width());
        let tile = world.at(x, y);
        let denom = mass_total[i].max(1e-6);
        let base = demand_weight(tile, mode) / denom;

        let d = field.dir[i];
        let down = if d >= 0 {
            let d = d as usize;
            adj_out[d] * (1.0 - retain[d])
        } else {
            0.0
        };

        adj_out[i] = base + down;
    }

    adj_out
}

pub fn plan_mitigation(
    world: &World,
    field: &HydrologyField,
    pollution_config: &RunoffPollutionConfig,
    mitigation_config: &RunoffMitigationConfig,
    mode: DemandWeightMode,
) -> MitigationPlan {
    let before = compute_runoff_pollution(world, field, None, pollution_config);
    let objective_before = before.residential_exposure_avg;

    let local_load = crate::runoff_pollution::compute_local_load(world, None, pollution_config);
    let forward = forward_for_adjoint(world, field, &local_load, pollution_config);
    let adj_out = adjoint_pass(world, field, &forward.0, &forward.1, mode);

    let mut candidates: Vec<(f32, usize)> = Vec::new();
    for y in 0..world.height() {
        for x in 0..world.width() {
            if !is_candidate(world, x, y, mitigation_config) {
                continue;
            }
            let idx = world.index(x, y);
            let cur_retain = current_retention(world, x, y, pollution_config);
            let new_retain = pollution_config.filtration_park.max(cur_retain);
            let benefit = adj_out[idx] * (new_retain - cur_retain) * forward.0[idx];
            if benefit > 0.0 {
                candidates.push((benefit, idx));
            }
        }
    }

    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap().then_with(|| a.1.cmp(&b.1)));

    let mut selected = Vec::new();
    for &(_, idx) in &candidates {
        if selected.len() as u32 >= mitigation_config.parks_to_add {
            break;
        }
        let (x, y) = (idx % world.width(), idx / world.width());
        let far_enough = selected.iter().all(|&s: &usize| {
            let (sx, sy) = (s % world.width(), s / world.width());
            (x as i64 - sx as i64).abs() + (y as i64 - sy as i64).abs() >= mitigation_config.min_separation
        });
        if far_enough {
            selected.push(idx);
        }
    }

    let mut after_world = world.clone();
    for &idx in &selected {
        let (x, y) = (idx % world.width(), idx / world.width());
        after_world.at_mut(x, y).overlay = Overlay::Park;
    }
    let after = compute_runoff_pollution(&after_world, field, None, pollution_config);

    MitigationPlan {
        selected_tiles: selected,
        objective_before,
        objective_after: after.residential_exposure_avg,
    }
}

fn forward_for_adjoint(
    world: &World,
    field: &HydrologyField,
    local_load: &[f32],
    config: &RunoffPollutionConfig,
) -> (Vec<f32>, Vec<f32>) {
    let n = world.width() * world.height();
    let mut mass_in = vec![0.0f32; n];
    let mut mass_total = vec![0.0f32; n];
    let mut retain = vec![0.0f32; n];

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
        let (x, y) = (u % world.width(), u / world.width());
        retain[u] = current_retention(world, x, y, config);
        let total = local_load[u] + mass_in[u];
        mass_total[u] = total;
        let outflow = total * (1.0 - retain[u]);
        let d = field.dir[u];
        if d >= 0 {
            mass_in[d as usize] += outflow;
        }
    }

    (mass_total, retain)
}

pub fn apply_runoff_mitigation_parks(world: &mut World, plan: &MitigationPlan) {
    for &idx in &plan.selected_tiles {
        let (x, y) = (idx % world.width(), idx / world.width());
        world.at_mut(x, y).overlay = Overlay::Park;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::build_hydrology_field;

    #[test]
    fn mitigation_never_selects_more_than_requested() {
        let mut world = World::new(6, 6, 1);
        for y in 0..6 {
            for x in 0..6 {
                world.at_mut(x, y).overlay = Overlay::Residential;
                world.at_mut(x, y).occupants = 10;
            }
        }
        let heights: Vec<f32> = (0..36).map(|i| (36 - i) as f32 * 0.01).collect();
        let hydro_config = crate::config::HydrologyConfig::default();
        let field = build_hydrology_field(&heights, 6, 6, &hydro_config);
        let pollution_config = RunoffPollutionConfig::default();
        let mitigation_config = RunoffMitigationConfig {
            parks_to_add: 3,
            min_separation: 1,
            include_zones: true,
            ..Default::default()
        };
        let plan = plan_mitigation(
            &world,
            &field,
            &pollution_config,
            &mitigation_config,
            DemandWeightMode::ResidentialOccupantsOnly,
        );
        assert!(plan.selected_tiles.len() <= 3);
    }
}
