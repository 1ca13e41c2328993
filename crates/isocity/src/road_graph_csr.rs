//! Building the road graph: nodes at endpoints/junctions, edges carrying the
//! ordered tile polyline between them.
//!
//! A CSR-style incident-edge-index layout (`CsrGraph{nodes, node_offsets,
//! edges, weights}`) as a plain value type, independent of any scene-graph
//! or ECS resource framework.

use crate::grid::Overlay;
use crate::world::World;

#[derive(Debug, Clone)]
pub struct RoadGraphNode {
    pub tile_index: usize,
    pub incident_edges: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct RoadGraphEdge {
    pub a: usize,
    pub b: usize,
    /// Ordered tile indices from node `a` to node `b`, inclusive of both ends.
    pub tiles: Vec<usize>,
    pub length: u32,
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub nodes: Vec<RoadGraphNode>,
    pub edges: Vec<RoadGraphEdge>,
}

fn road_degree(world: &World, x: usize, y: usize) -> usize {
    world
        .neighbors4(x, y)
        .into_iter()
        .flatten()
        .filter(|&(nx, ny)| world.at(nx, ny).overlay == Overlay::Road)
        .count()
}

fn road_neighbors(world: &World, x: usize, y: usize) -> Vec<(usize, usize)> {
    world
        .neighbors4(x, y)
        .into_iter()
        .flatten()
        .filter(|&(nx, ny)| world.at(nx, ny).overlay == Overlay::Road)
        .collect()
}

pub fn build_road_graph(world: &World) -> RoadGraph {
    let mut road_tiles = Vec::new();
    for y in 0..world.height() {
        for x in 0..world.width() {
            if world.at(x, y).overlay == Overlay::Road {
                road_tiles.push((x, y));
            }
        }
    }

    if road_tiles.is_empty() {
        return RoadGraph::default();
    }

    let mut node_tile_indices: Vec<usize> = road_tiles
        .iter()
        .filter(|&&(x, y)| road_degree(world, x, y) != 2)
        .map(|&(x, y)| world.index(x, y))
        .collect();

    if node_tile_indices.is_empty() {
        // A single closed loop with no junction: pin a node at the lowest tile
        // index so the loop still has somewhere to start tracing from.
        let min_tile = road_tiles
            .iter()
            .map(|&(x, y)| world.index(x, y))
            .min()
            .unwrap();
        node_tile_indices.push(min_tile);
    }
    node_tile_indices.sort_unstable();

    let mut node_of_tile = vec![usize::MAX; world.width() * world.height()];
    for (ni, &tidx) in node_tile_indices.iter().enumerate() {
        node_of_tile[tidx] = ni;
    }

    let mut nodes: Vec<RoadGraphNode> = node_tile_indices
        .iter()
        .map(|&tidx| RoadGraphNode {
            tile_index: tidx,
            incident_edges: Vec::new(),
        })
        .collect();

    let mut edges = Vec::new();
    // (from_tile, to_tile) directed traversal starts already consumed, keyed
    // by packed tile-pair so a chain is only walked once per direction.
    let mut consumed: std::collections::HashSet<(usize, usize)> = std::collections::HashSet::new();

    for (start_ni, &start_tile) in node_tile_indices.iter().enumerate() {
        let (sx, sy) = (start_tile % world.width(), start_tile / world.width());
        for (nx, ny) in road_neighbors(world, sx, sy) {
            let first_step = (start_tile, world.index(nx, ny));
            if consumed.contains(&first_step) {
                continue;
            }

            let mut tiles = vec![start_tile];
            let mut prev = start_tile;
            let mut cur = world.index(nx, ny);
            consumed.insert((prev, cur));

            loop {
                tiles.push(cur);
                let (cx, cy) = (cur % world.width(), cur / world.width());
                if node_of_tile[cur] != usize::MAX {
                    break;
                }
                let neighbors = road_neighbors(world, cx, cy);
                let next = neighbors
                    .into_iter()
                    .map(|(x, y)| world.index(x, y))
                    .find(|&t| t != prev);
                match next {
                    Some(nxt) => {
                        consumed.insert((cur, nxt));
                        prev = cur;
                        cur = nxt;
                    }
                    None => break,
                }
            }

            let end_ni = node_of_tile[cur];
            if end_ni == usize::MAX {
                // Dangling chain that looped back to the start without
                // crossing a pinned node tile; only possible for the
                // single-loop fallback, where start is the sole node.
                continue;
            }

            consumed.insert((cur, start_tile));
            let length = (tiles.len() - 1) as u32;
            let edge_idx = edges.len();
            edges.push(RoadGraphEdge {
                a: start_ni,
                b: end_ni,
                tiles,
                length,
                weight: length.max(1),
            });
            nodes[start_ni].incident_edges.push(edge_idx);
            if end_ni != start_ni {
                nodes[end_ni].incident_edges.push(edge_idx);
            }
        }
    }

    for node in &mut nodes {
        node.incident_edges.sort_unstable();
        node.incident_edges.dedup();
    }

    RoadGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_node_path_graph() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].length, 4);
    }

    #[test]
    fn t_junction_has_three_incident_edges() {
        let mut world = World::new(5, 3, 1);
        for x in 0..5 {
            world.set_road(x, 1, 1);
        }
        world.set_road(2, 0, 1);
        let graph = build_road_graph(&world);
        // junction at (2,1) plus two endpoints left/right and one endpoint up.
        let junction = graph
            .nodes
            .iter()
            .find(|n| n.tile_index == world.index(2, 1))
            .unwrap();
        assert_eq!(junction.incident_edges.len(), 3);
    }

    #[test]
    fn empty_world_has_no_road_graph() {
        let world = World::new(3, 3, 1);
        let graph = build_road_graph(&world);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }
}
