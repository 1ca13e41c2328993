//! City-block decomposition: maximal 4-connected regions of non-road land.
//!
//! Row-major scan, iterative flood fill with an explicit LIFO stack and a
//! fixed `{left, right, up, down}` neighbor order so block ids are a pure
//! function of the grid.

use crate::grid::Overlay;
use crate::world::World;

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayComposition {
    pub none: u32,
    pub park: u32,
    pub residential: u32,
    pub commercial: u32,
    pub industrial: u32,
    pub school: u32,
    pub hospital: u32,
    pub police_station: u32,
    pub fire_station: u32,
}

impl OverlayComposition {
    fn record(&mut self, overlay: Overlay) {
        match overlay {
            Overlay::None => self.none += 1,
            Overlay::Park => self.park += 1,
            Overlay::Residential => self.residential += 1,
            Overlay::Commercial => self.commercial += 1,
            Overlay::Industrial => self.industrial += 1,
            Overlay::School => self.school += 1,
            Overlay::Hospital => self.hospital += 1,
            Overlay::PoliceStation => self.police_station += 1,
            Overlay::FireStation => self.fire_station += 1,
            Overlay::Road => unreachable!("road tiles are never block tiles"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CityBlock {
    pub id: usize,
    pub area: u32,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
    pub road_edges: u32,
    pub water_edges: u32,
    pub outside_edges: u32,
    pub road_adj_tiles: u32,
    pub tiles: Vec<usize>,
    pub composition: OverlayComposition,
}

#[derive(Debug, Clone, Default)]
pub struct CityBlocksResult {
    pub blocks: Vec<CityBlock>,
    /// `tile_to_block[i] == -1` iff the tile is road or water.
    pub tile_to_block: Vec<i64>,
}

fn is_block_tile(world: &World, x: usize, y: usize) -> bool {
    let t = world.at(x, y);
    t.terrain != crate::grid::Terrain::Water && t.overlay != Overlay::Road
}

pub fn build_city_blocks(world: &World) -> CityBlocksResult {
    let w = world.width();
    let h = world.height();
    let mut tile_to_block = vec![-1i64; w * h];
    let mut visited = vec![false; w * h];
    let mut blocks = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = world.index(x, y);
            if visited[idx] || !is_block_tile(world, x, y) {
                continue;
            }

            let id = blocks.len();
            let mut block = CityBlock {
                id,
                area: 0,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                road_edges: 0,
                water_edges: 0,
                outside_edges: 0,
                road_adj_tiles: 0,
                tiles: Vec::new(),
                composition: OverlayComposition::default(),
            };

            let mut stack = vec![(x, y)];
            visited[idx] = true;

            while let Some((cx, cy)) = stack.pop() {
                let cidx = world.index(cx, cy);
                tile_to_block[cidx] = id as i64;
                block.area += 1;
                block.tiles.push(cidx);
                block.min_x = block.min_x.min(cx);
                block.min_y = block.min_y.min(cy);
                block.max_x = block.max_x.max(cx);
                block.max_y = block.max_y.max(cy);
                block.composition.record(world.at(cx, cy).overlay);

                let mut tile_touches_road = false;
                for neighbor in world.neighbors4(cx, cy) {
                    match neighbor {
                        None => block.outside_edges += 1,
                        Some((nx, ny)) => {
                            let nt = world.at(nx, ny);
                            if nt.terrain == crate::grid::Terrain::Water {
                                block.water_edges += 1;
                            } else if nt.overlay == Overlay::Road {
                                block.road_edges += 1;
                                tile_touches_road = true;
                            } else {
                                let nidx = world.index(nx, ny);
                                if !visited[nidx] {
                                    visited[nidx] = true;
                                    stack.push((nx, ny));
                                }
                            }
                        }
                    }
                }
                if tile_touches_road {
                    block.road_adj_tiles += 1;
                }
            }

            blocks.push(block);
        }
    }

    CityBlocksResult {
        blocks,
        tile_to_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_by_three_single_block() {
        let world = World::new(3, 3, 1);
        let result = build_city_blocks(&world);
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].area, 9);
        assert_eq!(result.blocks[0].outside_edges, 3 * 4);
        assert!(result.tile_to_block.iter().all(|&b| b == 0));
    }

    #[test]
    fn five_by_one_road_bisected_two_blocks() {
        let mut world = World::new(5, 1, 1);
        world.set_road(2, 0, 1);
        let result = build_city_blocks(&world);
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.blocks[0].area, 2);
        assert_eq!(result.blocks[1].area, 2);
        assert_eq!(result.tile_to_block[world.index(2, 0)], -1);
        assert_eq!(result.blocks[0].road_adj_tiles, 1);
        assert_eq!(result.blocks[1].road_adj_tiles, 1);
    }

    #[test]
    fn water_tiles_excluded_and_counted() {
        let mut world = World::new(3, 1, 1);
        world.at_mut(1, 0).terrain = crate::grid::Terrain::Water;
        let result = build_city_blocks(&world);
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.tile_to_block[world.index(1, 0)], -1);
        assert_eq!(result.blocks[0].water_edges, 1);
    }
}
