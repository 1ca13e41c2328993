//! Bridge and articulation-point detection on the road graph.
//!
//! Iterative Tarjan using an explicit per-frame cursor stack rather than
//! recursion, since the road graph can be deep enough on large worlds to
//! blow a recursive stack. Parallel edges are handled by comparing edge
//! indices, not neighbor ids, so a back edge is never mistaken for the edge
//! we arrived on.

use crate::road_graph_csr::RoadGraph;

#[derive(Debug, Clone, Default)]
pub struct ResilienceResult {
    pub is_bridge: Vec<bool>,
    pub is_articulation: Vec<bool>,
    pub component: Vec<i64>,
    pub bridge_subtree_nodes: Vec<u32>,
    pub bridge_other_nodes: Vec<u32>,
}

struct Frame {
    u: usize,
    /// Index into the node's incident-edge list of the next edge to examine.
    it: usize,
}

pub fn compute_resilience(graph: &RoadGraph) -> ResilienceResult {
    let n = graph.nodes.len();
    let m = graph.edges.len();

    let mut disc = vec![-1i64; n];
    let mut low = vec![0i64; n];
    let mut parent = vec![usize::MAX; n];
    let mut parent_edge = vec![usize::MAX; n];
    let mut child_count = vec![0u32; n];
    let mut subtree_size = vec![1u32; n];
    let mut component = vec![-1i64; n];

    let mut is_bridge = vec![false; m];
    let mut is_articulation = vec![false; n];
    let mut bridge_subtree_nodes = vec![0u32; m];

    let mut timer = 0i64;
    let mut comp_id = 0i64;

    for root in 0..n {
        if disc[root] != -1 {
            continue;
        }
        comp_id += 1;
        let mut stack: Vec<Frame> = vec![Frame { u: root, it: 0 }];
        disc[root] = timer;
        low[root] = timer;
        component[root] = comp_id - 1;
        timer += 1;

        while let Some(frame) = stack.last_mut() {
            let u = frame.u;
            let incident = &graph.nodes[u].incident_edges;

            if frame.it >= incident.len() {
                stack.pop();
                if let Some(p) = (parent[u] != usize::MAX).then(|| parent[u]) {
                    low[p] = low[p].min(low[u]);
                    subtree_size[p] += subtree_size[u];
                    let pe = parent_edge[u];
                    if low[u] > disc[p] {
                        is_bridge[pe] = true;
                        bridge_subtree_nodes[pe] = subtree_size[u];
                    }
                    if parent[p] != usize::MAX && low[u] >= disc[p] {
                        is_articulation[p] = true;
                    }
                }
                continue;
            }

            let e = incident[frame.it];
            frame.it += 1;
            let edge = &graph.edges[e];
            let v = if edge.a == u { edge.b } else { edge.a };

            if e == parent_edge[u] {
                continue;
            }

            if disc[v] == -1 {
                parent[v] = u;
                parent_edge[v] = e;
                component[v] = comp_id - 1;
                disc[v] = timer;
                low[v] = timer;
                timer += 1;
                child_count[u] += 1;
                stack.push(Frame { u: v, it: 0 });
            } else {
                low[u] = low[u].min(disc[v]);
            }
        }

        if child_count[root] > 1 {
            is_articulation[root] = true;
        }
    }

    let mut component_size = vec![0u32; comp_id.max(0) as usize];
    for &c in &component {
        if c >= 0 {
            component_size[c as usize] += 1;
        }
    }

    let mut bridge_other_nodes = vec![0u32; m];
    for (ei, edge) in graph.edges.iter().enumerate() {
        if is_bridge[ei] {
            let c = component[edge.a];
            let total = if c >= 0 { component_size[c as usize] } else { 0 };
            bridge_other_nodes[ei] = total.saturating_sub(bridge_subtree_nodes[ei]);
        }
    }

    ResilienceResult {
        is_bridge,
        is_articulation,
        component,
        bridge_subtree_nodes,
        bridge_other_nodes,
    }
}

/// Partitions the graph into the two sides reachable from an edge's endpoints
/// after removing that edge, by running a BFS from each endpoint. Returns
/// `None` if the partitions remain connected through some other path (i.e.
/// the edge was not actually a bridge).
pub fn compute_bridge_cut(graph: &RoadGraph, edge_index: usize) -> Option<(Vec<usize>, Vec<usize>)> {
    let edge = &graph.edges[edge_index];
    let reachable_excluding = |start: usize| -> Vec<usize> {
        let mut visited = vec![false; graph.nodes.len()];
        let mut queue = std::collections::VecDeque::new();
        visited[start] = true;
        queue.push_back(start);
        let mut out = Vec::new();
        while let Some(u) = queue.pop_front() {
            out.push(u);
            for &ei in &graph.nodes[u].incident_edges {
                if ei == edge_index {
                    continue;
                }
                let e = &graph.edges[ei];
                let v = if e.a == u { e.b } else { e.a };
                if !visited[v] {
                    visited[v] = true;
                    queue.push_back(v);
                }
            }
        }
        out
    };

    let side_a = reachable_excluding(edge.a);
    if side_a.contains(&edge.b) {
        return None;
    }
    let side_b = reachable_excluding(edge.b);
    Some((side_a, side_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road_graph_csr::build_road_graph;
    use crate::world::World;

    #[test]
    fn three_node_path_has_two_bridges_and_one_articulation() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        let result = compute_resilience(&graph);
        assert!(result.is_bridge.iter().all(|&b| b));
        assert_eq!(result.is_bridge.len(), 1);
    }

    #[test]
    fn bridge_cut_partitions_correctly() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        let (side_a, side_b) = compute_bridge_cut(&graph, 0).unwrap();
        assert_eq!(side_a.len() + side_b.len(), graph.nodes.len());
    }

    #[test]
    fn synthetic_three_node_path_a_b_c() {
        use crate::road_graph_csr::{RoadGraph, RoadGraphEdge, RoadGraphNode};

        let graph = RoadGraph {
            nodes: vec![
                RoadGraphNode { tile_index: 0, incident_edges: vec![0] },
                RoadGraphNode { tile_index: 1, incident_edges: vec![0, 1] },
                RoadGraphNode { tile_index: 2, incident_edges: vec![1] },
            ],
            edges: vec![
                RoadGraphEdge { a: 0, b: 1, tiles: vec![0, 1], length: 1, weight: 1 },
                RoadGraphEdge { a: 1, b: 2, tiles: vec![1, 2], length: 1, weight: 1 },
            ],
        };
        let result = compute_resilience(&graph);
        assert!(result.is_bridge[0]);
        assert!(result.is_bridge[1]);
        assert!(!result.is_articulation[0]);
        assert!(result.is_articulation[1]);
        assert!(!result.is_articulation[2]);
        // the edge discovered second (b-c) has the later-finished endpoint's
        // subtree (node c alone) of size 1.
        assert_eq!(result.bridge_subtree_nodes[1], 1);
    }

    #[test]
    fn cycle_has_no_bridges() {
        let mut world = World::new(3, 3, 1);
        for x in 0..3 {
            world.set_road(x, 0, 1);
            world.set_road(x, 2, 1);
        }
        world.set_road(0, 1, 1);
        world.set_road(2, 1, 1);
        let graph = build_road_graph(&world);
        let result = compute_resilience(&graph);
        assert!(result.is_bridge.iter().all(|&b| !b));
    }
}
