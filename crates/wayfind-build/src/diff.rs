//! Structural comparison of two graphs built from related primitive sets.

use serde::Serialize;
use std::collections::BTreeMap;
use wayfind_core::{Edge, NavGraph, NodeId};

/// What changed between two graphs. Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphDiff {
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    /// Same id, different kind, label or floor.
    pub changed_nodes: Vec<NodeId>,
    pub added_edges: Vec<String>,
    pub removed_edges: Vec<String>,
    pub reweighted_edges: Vec<String>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.changed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.reweighted_edges.is_empty()
    }

    /// One-line summary, e.g. `nodes +1 -2 ~0, edges +1 -3 ~0`.
    pub fn summary(&self) -> String {
        format!(
            "nodes +{} -{} ~{}, edges +{} -{} ~{}",
            self.added_nodes.len(),
            self.removed_nodes.len(),
            self.changed_nodes.len(),
            self.added_edges.len(),
            self.removed_edges.len(),
            self.reweighted_edges.len(),
        )
    }

    /// Whether `id` was added, removed or changed.
    pub fn touches_node(&self, id: &str) -> bool {
        [&self.added_nodes, &self.removed_nodes, &self.changed_nodes]
            .iter()
            .any(|list| list.iter().any(|n| n.as_str() == id))
    }
}

/// Compare `old` against `new`.
///
/// Node ids embed the quantized position, so a node that moved shows up as one
/// removal plus one addition. Edge ids embed kind and endpoints, so only the weight
/// can change under a stable edge id.
pub fn diff_graphs(old: &NavGraph, new: &NavGraph) -> GraphDiff {
    let mut diff = GraphDiff::default();

    for node in old.nodes() {
        match new.node(node.id.as_str()) {
            None => diff.removed_nodes.push(node.id.clone()),
            Some(other) if other != node => diff.changed_nodes.push(node.id.clone()),
            Some(_) => {}
        }
    }
    for node in new.nodes() {
        if !old.contains(node.id.as_str()) {
            diff.added_nodes.push(node.id.clone());
        }
    }

    let old_edges = index_edges(old);
    let new_edges = index_edges(new);
    for (id, edge) in &old_edges {
        match new_edges.get(id) {
            None => diff.removed_edges.push((*id).to_string()),
            Some(other) if other.weight != edge.weight => {
                diff.reweighted_edges.push((*id).to_string());
            }
            Some(_) => {}
        }
    }
    for id in new_edges.keys() {
        if !old_edges.contains_key(id) {
            diff.added_edges.push((*id).to_string());
        }
    }

    diff
}

fn index_edges(graph: &NavGraph) -> BTreeMap<&str, &Edge> {
    graph.edges().iter().map(|e| (e.id.as_str(), e)).collect()
}
