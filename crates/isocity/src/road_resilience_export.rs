//! JSON/CSV/DOT export for `RoadGraphResilience` results and `BypassPlanner`
//! suggestions.

use serde::Serialize;

use crate::bypass_planner::BypassSuggestion;
use crate::error::Result;
use crate::road_graph_csr::RoadGraph;
use crate::road_resilience::ResilienceResult;

#[derive(Serialize)]
struct EdgeJson {
    index: usize,
    a: usize,
    b: usize,
    length: u32,
    is_bridge: bool,
    bridge_subtree_nodes: u32,
    bridge_other_nodes: u32,
}

#[derive(Serialize)]
struct NodeJson {
    index: usize,
    tile_index: usize,
    is_articulation: bool,
    component: i64,
}

#[derive(Serialize)]
struct ResilienceJson {
    nodes: Vec<NodeJson>,
    edges: Vec<EdgeJson>,
}

pub fn export_resilience_json(graph: &RoadGraph, resilience: &ResilienceResult) -> Result<String> {
    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| NodeJson {
            index: i,
            tile_index: n.tile_index,
            is_articulation: resilience.is_articulation[i],
            component: resilience.component[i],
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .enumerate()
        .map(|(i, e)| EdgeJson {
            index: i,
            a: e.a,
            b: e.b,
            length: e.length,
            is_bridge: resilience.is_bridge[i],
            bridge_subtree_nodes: resilience.bridge_subtree_nodes[i],
            bridge_other_nodes: resilience.bridge_other_nodes[i],
        })
        .collect();

    serde_json::to_string_pretty(&ResilienceJson { nodes, edges })
        .map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

pub fn export_resilience_csv(graph: &RoadGraph, resilience: &ResilienceResult) -> String {
    let mut out = String::from("index,a,b,length,is_bridge,bridge_subtree_nodes,bridge_other_nodes\n");
    for (i, e) in graph.edges.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            i, e.a, e.b, e.length, resilience.is_bridge[i], resilience.bridge_subtree_nodes[i], resilience.bridge_other_nodes[i]
        ));
    }
    out
}

pub fn export_resilience_dot(graph: &RoadGraph, resilience: &ResilienceResult) -> String {
    let mut out = String::from("graph road_graph {\n");
    for (i, n) in graph.nodes.iter().enumerate() {
        if resilience.is_articulation[i] {
            out.push_str(&format!("  {i} [style=filled,fillcolor=red];\n"));
        }
    }
    for (i, e) in graph.edges.iter().enumerate() {
        let style = if resilience.is_bridge[i] { "bold" } else { "solid" };
        out.push_str(&format!("  {} -- {} [style={}];\n", e.a, e.b, style));
    }
    out.push_str("}\n");
    out
}

#[derive(Serialize)]
struct BypassJson {
    bridge_edge: usize,
    cut_size: usize,
    primary_cost: i64,
    money_cost: i64,
    new_tiles: u32,
    steps: u32,
    target_level: u8,
}

pub fn export_bypass_csv(suggestions: &[BypassSuggestion]) -> String {
    let mut out = String::from("rank,bridge_edge,cut_size,primary_cost,money_cost,new_tiles,steps,target_level\n");
    for (i, s) in suggestions.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            i + 1, s.bridge_edge, s.cut_size, s.primary_cost, s.money_cost, s.new_tiles, s.steps, s.target_level
        ));
    }
    out
}

pub fn export_bypass_json(suggestions: &[BypassSuggestion]) -> Result<String> {
    let records: Vec<BypassJson> = suggestions
        .iter()
        .map(|s| BypassJson {
            bridge_edge: s.bridge_edge,
            cut_size: s.cut_size,
            primary_cost: s.primary_cost,
            money_cost: s.money_cost,
            new_tiles: s.new_tiles,
            steps: s.steps,
            target_level: s.target_level,
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(|e| crate::error::IsoCityError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road_graph_csr::build_road_graph;
    use crate::road_resilience::compute_resilience;
    use crate::world::World;

    #[test]
    fn path_graph_both_edges_are_bridges_in_export() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        let resilience = compute_resilience(&graph);
        let csv = export_resilience_csv(&graph, &resilience);
        let bridge_count = csv
            .lines()
            .skip(1)
            .filter(|l| l.split(',').nth(4) == Some("true"))
            .count();
        assert_eq!(bridge_count, graph.edges.len());
    }

    #[test]
    fn json_export_round_trips() {
        let mut world = World::new(5, 1, 1);
        for x in 0..5 {
            world.set_road(x, 0, 1);
        }
        let graph = build_road_graph(&world);
        let resilience = compute_resilience(&graph);
        let json = export_resilience_json(&graph, &resilience).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["edges"].as_array().unwrap().len(), graph.edges.len());
    }
}
