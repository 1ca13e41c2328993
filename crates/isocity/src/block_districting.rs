//! District assignment over the block adjacency graph.
//!
//! Farthest-point seed selection over unweighted block-graph BFS distance,
//! then multi-source Dijkstra with a lexicographic `(dist, seedIndex)` key so
//! ties resolve the same way regardless of priority-queue implementation.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::city_block_graph::CityBlockGraphResult;
use crate::city_blocks::CityBlocksResult;
use crate::config::DISTRICT_COUNT;
use crate::grid::{Overlay, Terrain};
use crate::world::World;

#[derive(Debug, Clone, Copy)]
pub struct BlockDistrictingConfig {
    pub districts: usize,
    pub fill_road_tiles: bool,
    pub include_water: bool,
}

impl Default for BlockDistrictingConfig {
    fn default() -> Self {
        Self {
            districts: DISTRICT_COUNT,
            fill_road_tiles: true,
            include_water: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockDistrictingResult {
    pub block_district: Vec<u8>,
    pub tiles_per_district: Vec<u32>,
}

fn block_graph_neighbors(graph: &CityBlockGraphResult, block: usize) -> Vec<usize> {
    graph.incidence[block]
        .iter()
        .map(|&ei| {
            let e = &graph.edges[ei];
            if e.a == block {
                e.b
            } else {
                e.a
            }
        })
        .collect()
}

fn bfs_distances(graph: &CityBlockGraphResult, start: usize, n: usize) -> Vec<u32> {
    let mut dist = vec![u32::MAX; n];
    dist[start] = 0;
    let mut queue = VecDeque::new();
    queue.push_back(start);
    while let Some(u) = queue.pop_front() {
        for v in block_graph_neighbors(graph, u) {
            if dist[v] == u32::MAX {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

fn select_seeds(
    blocks: &CityBlocksResult,
    graph: &CityBlockGraphResult,
    k: usize,
) -> Vec<usize> {
    let n = blocks.blocks.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    let first = (0..n)
        .max_by_key(|&b| (blocks.blocks[b].area, std::cmp::Reverse(b)))
        .unwrap();

    let mut seeds = vec![first];
    let mut min_dist = bfs_distances(graph, first, n);

    while seeds.len() < k && seeds.len() < n {
        let next = (0..n)
            .filter(|b| !seeds.contains(b))
            .max_by_key(|&b| {
                let d = min_dist[b];
                let key = if d == u32::MAX { u64::MAX } else { d as u64 };
                (key, blocks.blocks[b].area, std::cmp::Reverse(b))
            });

        let Some(b) = next else { break };
        seeds.push(b);
        let d = bfs_distances(graph, b, n);
        for i in 0..n {
            min_dist[i] = min_dist[i].min(d[i]);
        }
    }

    seeds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueItem {
    dist: u32,
    district: u8,
    node: usize,
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest tuple sorts first.
        other
            .dist
            .cmp(&self.dist)
            .then_with(|| other.district.cmp(&self.district))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn assign_districts(
    blocks: &CityBlocksResult,
    graph: &CityBlockGraphResult,
    seeds: &[usize],
) -> Vec<u8> {
    let n = blocks.blocks.len();
    let mut dist = vec![u32::MAX; n];
    let mut owner = vec![u8::MAX; n];
    let mut heap = BinaryHeap::new();

    for (seed_idx, &b) in seeds.iter().enumerate() {
        dist[b] = 0;
        owner[b] = seed_idx as u8;
        heap.push(QueueItem {
            dist: 0,
            district: seed_idx as u8,
            node: b,
        });
    }

    while let Some(item) = heap.pop() {
        if item.dist != dist[item.node] || item.district != owner[item.node] {
            continue;
        }
        for v in block_graph_neighbors(graph, item.node) {
            let nd = item.dist + 1;
            if (nd, item.district) < (dist[v], owner[v]) {
                dist[v] = nd;
                owner[v] = item.district;
                heap.push(QueueItem {
                    dist: nd,
                    district: item.district,
                    node: v,
                });
            }
        }
    }

    owner
}

pub fn assign_districts_by_blocks(
    world: &mut World,
    blocks: &CityBlocksResult,
    graph: &CityBlockGraphResult,
    config: &BlockDistrictingConfig,
) -> BlockDistrictingResult {
    let block_count = blocks.blocks.len();
    let k = config.districts.min(block_count.max(1)).clamp(1, 8);

    let seeds = select_seeds(blocks, graph, k);
    let block_district = if block_count == 0 {
        Vec::new()
    } else {
        assign_districts(blocks, graph, &seeds)
    };

    for (x, y_t) in tile_coords(world) {
        let idx = world.index(x, y_t);
        let b = blocks.tile_to_block[idx];
        if b >= 0 {
            world.at_mut(x, y_t).district = block_district[b as usize];
            continue;
        }

        let tile = *world.at(x, y_t);
        if config.fill_road_tiles && tile.overlay == Overlay::Road {
            if let Some(d) = plurality_neighbor_district(world, blocks, &block_district, x, y_t, |nt| {
                nt.overlay != Overlay::Road && nt.terrain != Terrain::Water
            }) {
                world.at_mut(x, y_t).district = d;
            }
        } else if config.include_water && tile.terrain == Terrain::Water {
            if let Some(d) = plurality_neighbor_district(world, blocks, &block_district, x, y_t, |nt| {
                nt.terrain != Terrain::Water
            }) {
                world.at_mut(x, y_t).district = d;
            }
        }
    }

    let mut tiles_per_district = vec![0u32; k];
    for y_t in 0..world.height() {
        for x in 0..world.width() {
            let tile = world.at(x, y_t);
            if tile.terrain == Terrain::Water && !config.include_water {
                continue;
            }
            let d = tile.district as usize;
            if d < tiles_per_district.len() {
                tiles_per_district[d] += 1;
            }
        }
    }

    BlockDistrictingResult {
        block_district,
        tiles_per_district,
    }
}

fn tile_coords(world: &World) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..world.height()).flat_map(move |y| (0..world.width()).map(move |x| (x, y)))
}

fn plurality_neighbor_district(
    world: &World,
    blocks: &CityBlocksResult,
    block_district: &[u8],
    x: usize,
    y: usize,
    include: impl Fn(&crate::grid::Tile) -> bool,
) -> Option<u8> {
    let mut counts = [0u32; 256];
    let mut any = false;
    for neighbor in world.neighbors4(x, y) {
        if let Some((nx, ny)) = neighbor {
            let nt = world.at(nx, ny);
            if !include(nt) {
                continue;
            }
            let nidx = world.index(nx, ny);
            let b = blocks.tile_to_block[nidx];
            let d = if b >= 0 {
                block_district[b as usize]
            } else {
                nt.district
            };
            counts[d as usize] += 1;
            any = true;
        }
    }
    if !any {
        return None;
    }
    (0u16..256)
        .map(|d| d as usize)
        .max_by_key(|&d| (counts[d], std::cmp::Reverse(d)))
        .map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city_block_graph::build_city_block_graph;
    use crate::city_blocks::build_city_blocks;

    #[test]
    fn two_isolated_blocks_get_distinct_districts() {
        let mut world = World::new(5, 1, 1);
        world.at_mut(2, 0).terrain = Terrain::Water;
        let blocks = build_city_blocks(&world);
        let graph = build_city_block_graph(&world, &blocks);
        let config = BlockDistrictingConfig {
            districts: 2,
            ..Default::default()
        };
        let result = assign_districts_by_blocks(&mut world, &blocks, &graph, &config);
        assert_eq!(result.block_district.len(), 2);
        assert_ne!(result.block_district[0], result.block_district[1]);
    }

    #[test]
    fn districts_clamped_to_block_count() {
        let world0 = World::new(3, 3, 1);
        let blocks = build_city_blocks(&world0);
        let graph = build_city_block_graph(&world0, &blocks);
        let mut world = world0;
        let config = BlockDistrictingConfig {
            districts: 8,
            ..Default::default()
        };
        let result = assign_districts_by_blocks(&mut world, &blocks, &graph, &config);
        assert_eq!(result.block_district.len(), 1);
        assert_eq!(result.tiles_per_district.len(), 1);
    }
}
