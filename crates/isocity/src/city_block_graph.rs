//! Block adjacency graph: which blocks touch which roads, and each other.
//!
//! A frontage pass over block tiles followed by an adjacency pass over road
//! tiles, both keyed by a packed `(min<<32)|max` u64 so edge discovery order
//! never depends on hash iteration.

use std::collections::BTreeMap;

use crate::city_blocks::CityBlocksResult;
use crate::grid::Overlay;
use crate::world::World;

#[derive(Debug, Clone, Copy, Default)]
pub struct Frontage {
    pub road_edges_by_level: [u32; 4],
    pub road_adj_tiles_by_level: [u32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct BlockAdjacencyEdge {
    pub a: usize,
    pub b: usize,
    pub touching_road_tiles: u32,
    pub touching_road_tiles_by_level: [u32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct CityBlockGraphResult {
    pub frontage: Vec<Frontage>,
    pub edges: Vec<BlockAdjacencyEdge>,
    /// Per-block list of incident edge indices, ascending.
    pub incidence: Vec<Vec<usize>>,
}

fn pack_pair(a: usize, b: usize) -> u64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    ((lo as u64) << 32) | (hi as u64)
}

pub fn build_city_block_graph(world: &World, blocks: &CityBlocksResult) -> CityBlockGraphResult {
    let block_count = blocks.blocks.len();
    let mut frontage = vec![Frontage::default(); block_count];

    for block in &blocks.blocks {
        for &tidx in &block.tiles {
            let y = tidx / world.width();
            let x = tidx % world.width();
            let mut levels_seen = [false; 4];
            for neighbor in world.neighbors4(x, y) {
                if let Some((nx, ny)) = neighbor {
                    let nt = world.at(nx, ny);
                    if nt.overlay == Overlay::Road {
                        let lvl = nt.road_level().clamp(1, 3) as usize;
                        frontage[block.id].road_edges_by_level[lvl] += 1;
                        levels_seen[lvl] = true;
                    }
                }
            }
            for lvl in 1..=3 {
                if levels_seen[lvl] {
                    frontage[block.id].road_adj_tiles_by_level[lvl] += 1;
                }
            }
        }
    }

    let mut edge_map: BTreeMap<u64, BlockAdjacencyEdge> = BTreeMap::new();

    for y in 0..world.height() {
        for x in 0..world.width() {
            let tile = world.at(x, y);
            if tile.overlay != Overlay::Road {
                continue;
            }
            let lvl = tile.road_level().clamp(1, 3) as usize;

            let mut distinct_blocks: Vec<usize> = Vec::with_capacity(4);
            for neighbor in world.neighbors4(x, y) {
                if let Some((nx, ny)) = neighbor {
                    let nidx = world.index(nx, ny);
                    let b = blocks.tile_to_block[nidx];
                    if b >= 0 {
                        let b = b as usize;
                        if !distinct_blocks.contains(&b) {
                            distinct_blocks.push(b);
                        }
                    }
                }
            }

            for i in 0..distinct_blocks.len() {
                for j in (i + 1)..distinct_blocks.len() {
                    let (a, b) = (distinct_blocks[i], distinct_blocks[j]);
                    let key = pack_pair(a, b);
                    let entry = edge_map.entry(key).or_insert_with(|| BlockAdjacencyEdge {
                        a: a.min(b),
                        b: a.max(b),
                        touching_road_tiles: 0,
                        touching_road_tiles_by_level: [0; 4],
                    });
                    entry.touching_road_tiles += 1;
                    entry.touching_road_tiles_by_level[lvl] += 1;
                }
            }
        }
    }

    let edges: Vec<BlockAdjacencyEdge> = edge_map.into_values().collect();
    let mut incidence = vec![Vec::new(); block_count];
    for (ei, e) in edges.iter().enumerate() {
        incidence[e.a].push(ei);
        incidence[e.b].push(ei);
    }
    for inc in &mut incidence {
        inc.sort_unstable();
    }

    CityBlockGraphResult {
        frontage,
        edges,
        incidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city_blocks::build_city_blocks;

    #[test]
    fn five_by_one_two_blocks_one_edge() {
        let mut world = World::new(5, 1, 1);
        world.set_road(2, 0, 1);
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].a, 0);
        assert_eq!(graph.edges[0].b, 1);
        assert_eq!(graph.edges[0].touching_road_tiles, 1);
        assert_eq!(graph.incidence[0], vec![0]);
        assert_eq!(graph.incidence[1], vec![0]);
    }

    #[test]
    fn two_isolated_blocks_no_edge() {
        let mut world = World::new(5, 1, 1);
        world.at_mut(2, 0).terrain = crate::grid::Terrain::Water;
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        assert_eq!(blocks.blocks.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn edges_sorted_lexicographically() {
        let mut world = World::new(5, 5, 1);
        for x in 0..5 {
            world.set_road(x, 2, 1);
        }
        for y in 0..5 {
            world.set_road(2, y, 1);
        }
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        let mut sorted = graph.edges.clone();
        sorted.sort_by_key(|e| (e.a, e.b));
        let orig: Vec<(usize, usize)> = graph.edges.iter().map(|e| (e.a, e.b)).collect();
        let sorted_pairs: Vec<(usize, usize)> = sorted.iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(orig, sorted_pairs);
    }
}
