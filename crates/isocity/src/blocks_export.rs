//! JSON/CSV/DOT export for `CityBlocks`, the block adjacency graph, and
//! `BlockDistricting` results.
//!
//! Flat serde records, a header-first CSV writer with fixed field order, and
//! a `.dot` writer emitting an undirected graph of integer-id nodes for
//! quick visual debugging.

use serde::Serialize;

use crate::block_districting::BlockDistrictingResult;
use crate::city_block_graph::CityBlockGraphResult;
use crate::city_blocks::CityBlocksResult;
use crate::error::Result;

#[derive(Serialize)]
struct BlockJson {
    id: usize,
    area: u32,
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    road_edges: u32,
    water_edges: u32,
    outside_edges: u32,
    road_adj_tiles: u32,
    district: Option<u8>,
}

#[derive(Serialize)]
struct EdgeJson {
    a: usize,
    b: usize,
    touching_road_tiles: u32,
    touching_road_tiles_by_level: [u32; 4],
}

#[derive(Serialize)]
struct BlocksJson {
    blocks: Vec<BlockJson>,
    edges: Vec<EdgeJson>,
    tiles_per_district: Option<Vec<u32>>,
}

pub fn export_blocks_json(
    blocks: &CityBlocksResult,
    graph: &CityBlockGraphResult,
    districting: Option<&BlockDistrictingResult>,
) -> Result<String> {
    let block_records = blocks
        .blocks
        .iter()
        .map(|b| BlockJson {
            id: b.id,
            area: b.area,
            min_x: b.min_x,
            min_y: b.min_y,
            max_x: b.max_x,
            max_y: b.max_y,
            road_edges: b.road_edges,
            water_edges: b.water_edges,
            outside_edges: b.outside_edges,
            road_adj_tiles: b.road_adj_tiles,
            district: districting.map(|d| d.block_district[b.id]),
        })
        .collect();

    let edge_records = graph
        .edges
        .iter()
        .map(|e| EdgeJson {
            a: e.a,
            b: e.b,
            touching_road_tiles: e.touching_road_tiles,
            touching_road_tiles_by_level: e.touching_road_tiles_by_level,
        })
        .collect();

    let doc = BlocksJson {
        blocks: block_records,
        edges: edge_records,
        tiles_per_district: districting.map(|d| d.tiles_per_district.clone()),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

pub fn export_blocks_csv(blocks: &CityBlocksResult) -> String {
    let mut out = String::from(
        "id,area,min_x,min_y,max_x,max_y,road_edges,water_edges,outside_edges,road_adj_tiles\n",
    );
    for b in &blocks.blocks {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            b.id, b.area, b.min_x, b.min_y, b.max_x, b.max_y, b.road_edges, b.water_edges, b.outside_edges, b.road_adj_tiles
        ));
    }
    out
}

pub fn export_block_graph_dot(graph: &CityBlockGraphResult) -> String {
    let mut out = String::from("graph city_blocks {\n");
    for e in &graph.edges {
        out.push_str(&format!(
            "  {} -- {} [label=\"{}\"];\n",
            e.a, e.b, e.touching_road_tiles
        ));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city_block_graph::build_city_block_graph;
    use crate::city_blocks::build_city_blocks;
    use crate::world::World;

    #[test]
    fn json_export_is_valid_and_has_one_block() {
        let world = World::new(3, 3, 1);
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        let json = export_blocks_json(&blocks, &graph, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["blocks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn csv_export_has_header_and_one_row_per_block() {
        let world = World::new(3, 3, 1);
        let blocks = build_city_blocks(&world);
        let csv = export_blocks_csv(&blocks);
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn dot_export_has_one_edge_line_per_adjacency() {
        let mut world = World::new(5, 1, 1);
        world.set_road(2, 0, 1);
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        let dot = export_block_graph_dot(&graph);
        assert_eq!(dot.lines().filter(|l| l.contains("--")).count(), 1);
    }
}
