//! Integration tests proving the analysis pipelines compose end to end and
//! stay bit-reproducible for a fixed seed.
//!
//! Run: cargo test -p isocity --test full_pipeline

use isocity::block_districting::{assign_districts_by_blocks, BlockDistrictingConfig};
use isocity::city_block_graph::build_city_block_graph;
use isocity::city_blocks::build_city_blocks;
use isocity::config::{
    BypassPlannerConfig, ContoursConfig, ErosionConfig, HydrologyConfig, RoadHealthConfig, RunoffPollutionConfig,
};
use isocity::contours::build_contours;
use isocity::economy::compute_economy_snapshot;
use isocity::erosion::erode;
use isocity::grid::Overlay;
use isocity::hydrology::build_hydrology_field;
use isocity::road_graph_csr::build_road_graph;
use isocity::road_health::compute_road_health;
use isocity::road_resilience::compute_resilience;
use isocity::runoff_mitigation::{plan_mitigation, DemandWeightMode, RunoffMitigationConfig};
use isocity::runoff_pollution::compute_runoff_pollution;
use isocity::trade_market::compute_trade_market_snapshot;
use isocity::worldgen::generate_world;

fn build_test_world(seed: u64) -> isocity::world::World {
    let mut world = generate_world(24, 24, seed);
    for x in 0..24 {
        world.set_road(x, 12, 1);
    }
    for y in 0..24 {
        world.set_road(12, y, 1);
    }
    for y in 8..16 {
        for x in 8..16 {
            if world.at(x, y).overlay == Overlay::None {
                world.at_mut(x, y).overlay = Overlay::Residential;
                world.at_mut(x, y).occupants = 4;
            }
        }
    }
    world
}

fn heights_of(world: &isocity::world::World) -> Vec<f32> {
    world.tiles().iter().map(|t| t.height).collect()
}

#[test]
fn full_pipeline_runs_and_is_deterministic_for_a_fixed_seed() {
    let mut world_a = build_test_world(7);
    let mut world_b = build_test_world(7);

    let blocks_a = build_city_blocks(&world_a);
    let blocks_b = build_city_blocks(&world_b);
    assert_eq!(blocks_a.blocks.len(), blocks_b.blocks.len());

    let graph_a = build_city_block_graph(&world_a, &blocks_a);
    let graph_b = build_city_block_graph(&world_b, &blocks_b);
    let districting_config = BlockDistrictingConfig::default();
    let districting_a = assign_districts_by_blocks(&mut world_a, &blocks_a, &graph_a, &districting_config);
    let districting_b = assign_districts_by_blocks(&mut world_b, &blocks_b, &graph_b, &districting_config);
    assert_eq!(districting_a.block_district, districting_b.block_district);

    let road_graph = build_road_graph(&world_a);
    let resilience = compute_resilience(&road_graph);
    let health_config = RoadHealthConfig::default();
    let health = compute_road_health(&road_graph, &resilience, world_a.width(), world_a.height(), &health_config);
    assert_eq!(health.centrality01.len(), road_graph.nodes.len());

    let bypass_config = BypassPlannerConfig::default();
    assert!(bypass_config.top > 0);

    let mut heights = heights_of(&world_a);
    let hydro_config = HydrologyConfig::default();
    let field = build_hydrology_field(&heights, 24, 24, &hydro_config);
    assert_eq!(field.dir.len(), 24 * 24);

    let contours_config = ContoursConfig::default();
    let contour_levels = build_contours(&heights, 24, 24, &[0.0, 0.5], &contours_config).unwrap();
    assert_eq!(contour_levels.len(), 2);

    let erosion_config = ErosionConfig::default();
    erode(&mut heights, 24, 24, &erosion_config, true);
    assert_eq!(heights.len(), 24 * 24);

    let pollution_config = RunoffPollutionConfig::default();
    let pollution = compute_runoff_pollution(&world_a, &field, None, &pollution_config);
    assert!(pollution.residential_exposure_avg.is_finite());

    let mitigation_config = RunoffMitigationConfig { parks_to_add: 2, ..RunoffMitigationConfig::default() };
    let plan = plan_mitigation(
        &world_a,
        &field,
        &pollution_config,
        &mitigation_config,
        DemandWeightMode::ResidentialOccupantsOnly,
    );
    assert!(plan.selected_tiles.len() <= 2);

    let snapshot_a = compute_economy_snapshot(&world_a, 10);
    let snapshot_b = compute_economy_snapshot(&world_b, 10);
    assert_eq!(snapshot_a.macro_index, snapshot_b.macro_index);
    for (sa, sb) in snapshot_a.sectors.iter().zip(snapshot_b.sectors.iter()) {
        assert_eq!(sa.name, sb.name);
    }

    let market_a = compute_trade_market_snapshot(&world_a, 10, 6, 4);
    let market_b = compute_trade_market_snapshot(&world_b, 10, 6, 4);
    assert_eq!(
        market_a.commodities.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        market_b.commodities.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
    );
}

#[test]
fn save_and_reload_preserves_full_world_state() {
    let world = build_test_world(42);
    let bytes = isocity::save::save_world_to_bytes(&world).unwrap();
    let loaded = isocity::save::load_world_from_bytes(&bytes).unwrap();
    assert_eq!(loaded.width(), world.width());
    assert_eq!(loaded.height(), world.height());
    assert_eq!(loaded.seed(), world.seed());
    for (a, b) in world.tiles().iter().zip(loaded.tiles()) {
        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.overlay, b.overlay);
        assert_eq!(a.height, b.height);
    }
}
