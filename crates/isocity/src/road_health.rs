//! Per-tile road-network health fields: centrality, vulnerability, bypass coverage.
//!
//! Betweenness follows a Brandes-style shortest-path accumulation, computed
//! exactly for small graphs and sampled for large ones by auto-switching on
//! node count.

use std::collections::{HashSet, VecDeque};

use crate::config::RoadHealthConfig;
use crate::road_graph_csr::RoadGraph;
use crate::road_resilience::ResilienceResult;

#[derive(Debug, Clone, Default)]
pub struct RoadHealthResult {
    pub centrality01: Vec<f32>,
    pub vulnerability01: Vec<f32>,
    pub bypass_mask: Vec<bool>,
}

/// Brandes single-source accumulation restricted to unweighted (step) edges,
/// returning per-node and per-edge betweenness contributions from `source`.
fn brandes_from_source(graph: &RoadGraph, source: usize) -> (Vec<f64>, Vec<f64>) {
    let n = graph.nodes.len();
    let m = graph.edges.len();
    let mut dist = vec![-1i64; n];
    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);

    dist[source] = 0;
    sigma[source] = 1.0;
    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &ei in &graph.nodes[u].incident_edges {
            let e = &graph.edges[ei];
            let v = if e.a == u { e.b } else { e.a };
            if dist[v] == -1 {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
            if dist[v] == dist[u] + 1 {
                sigma[v] += sigma[u];
                preds[v].push((u, ei));
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    let mut edge_delta = vec![0.0f64; m];
    for &w in order.iter().rev() {
        for &(v, ei) in &preds[w] {
            let contrib = (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            delta[v] += contrib;
            edge_delta[ei] += contrib;
        }
    }

    (delta, edge_delta)
}

fn sample_sources(n: usize, count: usize) -> Vec<usize> {
    let mut keyed: Vec<(u64, usize)> = (0..n).map(|i| (crate::detmath::hash_u64(i as u64), i)).collect();
    keyed.sort_unstable();
    keyed.into_iter().take(count.min(n)).map(|(_, i)| i).collect()
}

/// Stamps `value` onto `tile` and its up-to-4 orthogonal neighbors
/// (`StampCross` in the original `RoadHealth.cpp`), taking the elementwise
/// max so repeated stamps never lower a tile's score.
fn stamp_cross(field: &mut [f32], width: usize, height: usize, tile: usize, value: f32) {
    field[tile] = field[tile].max(value);
    let x = tile % width;
    let y = tile / width;
    let cand = [
        (x as i64 - 1, y as i64),
        (x as i64 + 1, y as i64),
        (x as i64, y as i64 - 1),
        (x as i64, y as i64 + 1),
    ];
    for (nx, ny) in cand {
        if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
            let nidx = ny as usize * width + nx as usize;
            field[nidx] = field[nidx].max(value);
        }
    }
}

pub fn compute_road_health(
    graph: &RoadGraph,
    resilience: &ResilienceResult,
    width: usize,
    height: usize,
    config: &RoadHealthConfig,
) -> RoadHealthResult {
    let n = graph.nodes.len();
    let m = graph.edges.len();

    if n == 0 {
        return RoadHealthResult::default();
    }

    let sources: Vec<usize> = if config.max_sources == 0 && n <= config.auto_exact_max_nodes {
        (0..n).collect()
    } else {
        let count = if config.max_sources > 0 {
            config.max_sources
        } else {
            config.auto_sample_sources
        };
        sample_sources(n, count)
    };

    let scale = if sources.len() < n {
        n as f64 / sources.len() as f64
    } else {
        1.0
    };

    let mut node_between = vec![0.0f64; n];
    let mut edge_between = vec![0.0f64; m];
    for &s in &sources {
        let (delta, edge_delta) = brandes_from_source(graph, s);
        for i in 0..n {
            node_between[i] += delta[i];
        }
        for i in 0..m {
            edge_between[i] += edge_delta[i];
        }
    }
    for v in &mut node_between {
        *v = (*v * scale) / 2.0;
    }
    for v in &mut edge_between {
        *v = (*v * scale) / 2.0;
    }

    let norm = ((n as f64 - 1.0) * (n as f64 - 2.0) / 2.0).max(1.0);
    let mut edge_norm: Vec<f32> = edge_between.iter().map(|&v| (v / norm) as f32).collect();
    let max_edge = edge_norm.iter().cloned().fold(0.0f32, f32::max);
    if max_edge > 1.0 {
        for v in &mut edge_norm {
            *v /= max_edge;
        }
    }

    let mut node_norm: Vec<f32> = node_between.iter().map(|&v| (v / norm) as f32).collect();
    let max_node = node_norm.iter().cloned().fold(0.0f32, f32::max);
    if max_node > 1.0 {
        for v in &mut node_norm {
            *v /= max_node;
        }
    }

    let max_tile = width * height;

    let mut centrality01 = vec![0.0f32; max_tile];
    for (ei, edge) in graph.edges.iter().enumerate() {
        let v = edge_norm[ei];
        for &t in &edge.tiles {
            centrality01[t] = centrality01[t].max(v);
        }
    }
    if config.include_node_centrality {
        for (ni, node) in graph.nodes.iter().enumerate() {
            stamp_cross(&mut centrality01, width, height, node.tile_index, node_norm[ni]);
        }
    }

    let mut vulnerability01 = vec![0.0f32; max_tile];
    for (ei, edge) in graph.edges.iter().enumerate() {
        if !resilience.is_bridge[ei] {
            continue;
        }
        let sub = resilience.bridge_subtree_nodes[ei] as f64;
        let other = resilience.bridge_other_nodes[ei] as f64;
        let total = (sub + other).max(1.0);
        let impact = (2.0 * sub.min(other) / total) as f32;
        for &t in &edge.tiles {
            vulnerability01[t] = vulnerability01[t].max(impact);
        }
    }
    for (ni, node) in graph.nodes.iter().enumerate() {
        if resilience.is_articulation[ni] {
            let floor = config.articulation_vulnerability_base + node_norm[ni] * (1.0 - config.articulation_vulnerability_base);
            stamp_cross(&mut vulnerability01, width, height, node.tile_index, floor);
        }
    }

    let bypass_mask = vec![false; max_tile];

    RoadHealthResult {
        centrality01,
        vulnerability01,
        bypass_mask,
    }
}

/// Stamps bypass-suggestion tile coverage onto a health result's `bypass_mask`.
pub fn stamp_bypass_mask(result: &mut RoadHealthResult, paths: &[Vec<usize>]) {
    let mut set = HashSet::new();
    for path in paths {
        for &t in path {
            set.insert(t);
        }
    }
    for &t in &set {
        if t < result.bypass_mask.len() {
            result.bypass_mask[t] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road_graph_csr::build_road_graph;
    use crate::road_resilience::compute_resilience;
    use crate::world::World;

    #[test]
    fn bridge_tile_has_high_vulnerability() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        let resilience = compute_resilience(&graph);
        let config = RoadHealthConfig::default();
        let health = compute_road_health(&graph, &resilience, world.width(), world.height(), &config);
        assert!(health.vulnerability01.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn empty_graph_returns_empty_result() {
        let world = World::new(3, 3, 1);
        let graph = build_road_graph(&world);
        let resilience = compute_resilience(&graph);
        let health = compute_road_health(
            &graph,
            &resilience,
            world.width(),
            world.height(),
            &RoadHealthConfig::default(),
        );
        assert!(health.centrality01.is_empty());
    }
}
