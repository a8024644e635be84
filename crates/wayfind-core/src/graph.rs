//! Graph data model for the navigation engine.

use crate::error::{NavError, NavResult};
use crate::geometry::{BoundingBox, Point};
use crate::ids::NodeId;
use crate::integrity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

/// Current graph document version.
pub const GRAPH_VERSION: &str = "1.0.0";

/// The routable navigation graph derived from a [`crate::PrimitiveSet`].
///
/// Immutable once constructed: a rebuild produces a new value, so queries running
/// against an older graph are never affected. The adjacency index is built lazily
/// on first use and is safe to share across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavGraph {
    version: String,
    source: GraphSource,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    bounds: Option<BoundingBox>,
    #[serde(skip)]
    adjacency: OnceLock<HashMap<NodeId, Vec<Neighbor>>>,
}

/// Where a graph came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSource {
    pub plan_id: String,
    /// Digest of the primitive set the graph was built from (cache key).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
    /// Digest of the build settings used, so a config change invalidates the cache.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub settings: String,
}

/// The role of a node on the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Room,
    Door,
    Waypoint,
    Stair,
    Lift,
    Exit,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Room => "room",
            NodeKind::Door => "door",
            NodeKind::Waypoint => "waypoint",
            NodeKind::Stair => "stair",
            NodeKind::Lift => "lift",
            NodeKind::Exit => "exit",
        }
    }

    /// Doors and exits are passed through rather than turned at.
    pub fn is_doorway(self) -> bool {
        matches!(self, NodeKind::Door | NodeKind::Exit)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routable point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    /// Id of the primitive this node was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Node {
    /// Human-facing name: label, then source primitive id, then node id.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .or(self.source_id.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Which builder rule produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    DoorRoom,
    DoorHallway,
    Hallway,
    RoomFallback,
    FloorChange,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::DoorRoom => "door_room",
            EdgeKind::DoorHallway => "door_hallway",
            EdgeKind::Hallway => "hallway",
            EdgeKind::RoomFallback => "room_fallback",
            EdgeKind::FloorChange => "floor_change",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weighted connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
    pub kind: EdgeKind,
    /// When false the edge may only be traversed `from -> to`.
    pub bidirectional: bool,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, weight: f64, kind: EdgeKind, bidirectional: bool) -> Self {
        let id = if bidirectional {
            format!("{kind}:{from}~{to}")
        } else {
            format!("{kind}:{from}>{to}")
        };
        Self {
            id,
            from,
            to,
            weight,
            kind,
            bidirectional,
        }
    }

    /// Whether the edge can be walked from `a` to `b`.
    pub fn allows(&self, a: &str, b: &str) -> bool {
        (self.from.as_str() == a && self.to.as_str() == b)
            || (self.bidirectional && self.from.as_str() == b && self.to.as_str() == a)
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other(&self, id: &str) -> Option<&NodeId> {
        if self.from.as_str() == id {
            Some(&self.to)
        } else if self.to.as_str() == id {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// An outgoing, traversable connection from a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub node: NodeId,
    /// Index into [`NavGraph::edges`].
    pub edge: usize,
    pub weight: f64,
}

/// Node and edge counts per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
    pub floors: Vec<i32>,
    pub components: usize,
}

impl NavGraph {
    /// Assemble a graph from nodes and edges, enforcing the graph invariants.
    pub fn from_parts(
        source: GraphSource,
        nodes: impl IntoIterator<Item = Node>,
        edges: Vec<Edge>,
    ) -> NavResult<Self> {
        let mut map = BTreeMap::new();
        for node in nodes {
            if let Some(prev) = map.insert(node.id.clone(), node) {
                return Err(NavError::Invariant(format!("duplicate node id {}", prev.id)));
            }
        }
        let bounds = BoundingBox::from_points(map.values().map(|n| n.position));
        let graph = Self {
            version: GRAPH_VERSION.to_string(),
            source,
            nodes: map,
            edges,
            bounds,
            adjacency: OnceLock::new(),
        };
        integrity::ensure(&graph)?;
        Ok(graph)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> &GraphSource {
        &self.source
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes derived from the given primitive.
    pub fn nodes_from_source<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .values()
            .filter(move |n| n.source_id.as_deref() == Some(source_id))
    }

    /// Traversable neighbors of `id`, in edge order.
    pub fn neighbors(&self, id: &str) -> &[Neighbor] {
        self.adjacency()
            .get(id)
            .map_or(&[] as &[Neighbor], |v| v.as_slice())
    }

    /// The first edge that can be walked from `a` to `b`.
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.neighbors(a)
            .iter()
            .find(|n| n.node.as_str() == b)
            .map(|n| &self.edges[n.edge])
    }

    fn adjacency(&self) -> &HashMap<NodeId, Vec<Neighbor>> {
        self.adjacency.get_or_init(|| {
            let mut adj: HashMap<NodeId, Vec<Neighbor>> = HashMap::new();
            for (i, edge) in self.edges.iter().enumerate() {
                adj.entry(edge.from.clone()).or_default().push(Neighbor {
                    node: edge.to.clone(),
                    edge: i,
                    weight: edge.weight,
                });
                if edge.bidirectional {
                    adj.entry(edge.to.clone()).or_default().push(Neighbor {
                        node: edge.from.clone(),
                        edge: i,
                        weight: edge.weight,
                    });
                }
            }
            adj
        })
    }

    /// Undirected connected components, each sorted, ordered by their smallest id.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut undirected: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            undirected
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
            undirected
                .entry(edge.to.as_str())
                .or_default()
                .push(edge.from.as_str());
        }

        let mut component_of: HashMap<&str, usize> = HashMap::new();
        let mut components: Vec<Vec<NodeId>> = Vec::new();
        for id in self.nodes.keys() {
            if component_of.contains_key(id.as_str()) {
                continue;
            }
            let index = components.len();
            let mut members = Vec::new();
            let mut queue = VecDeque::from([id.as_str()]);
            component_of.insert(id.as_str(), index);
            while let Some(current) = queue.pop_front() {
                members.push(NodeId::from(current));
                for &next in undirected.get(current).into_iter().flatten() {
                    if !component_of.contains_key(next) {
                        component_of.insert(next, index);
                        queue.push_back(next);
                    }
                }
            }
            members.sort();
            components.push(members);
        }
        components
    }

    /// Whether `a` and `b` share an undirected component.
    pub fn same_component(&self, a: &str, b: &str) -> bool {
        self.connected_components()
            .iter()
            .any(|c| c.iter().any(|n| n.as_str() == a) && c.iter().any(|n| n.as_str() == b))
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            components: self.connected_components().len(),
            ..GraphStats::default()
        };
        for node in self.nodes.values() {
            *stats.nodes_by_kind.entry(node.kind).or_insert(0) += 1;
            if let Some(f) = node.floor
                && !stats.floors.contains(&f)
            {
                stats.floors.push(f);
            }
        }
        stats.floors.sort_unstable();
        for edge in &self.edges {
            *stats.edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }
        stats
    }
}

impl PartialEq for NavGraph {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.source == other.source
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.bounds == other.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::from(id),
            kind,
            position: Point::new(x, y),
            floor: None,
            source_id: None,
            label: None,
        }
    }

    fn line_graph() -> NavGraph {
        NavGraph::from_parts(
            GraphSource::default(),
            vec![
                node("a", NodeKind::Room, 0.0, 0.0),
                node("b", NodeKind::Door, 1.0, 0.0),
                node("c", NodeKind::Room, 2.0, 0.0),
                node("z", NodeKind::Room, 9.0, 9.0),
            ],
            vec![
                Edge::new("a".into(), "b".into(), 1.0, EdgeKind::DoorRoom, true),
                Edge::new("b".into(), "c".into(), 1.0, EdgeKind::DoorRoom, false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_neighbors_respect_direction() {
        let g = line_graph();
        let from_b: Vec<&str> = g.neighbors("b").iter().map(|n| n.node.as_str()).collect();
        assert_eq!(from_b, vec!["a", "c"]);
        let from_c: Vec<&str> = g.neighbors("c").iter().map(|n| n.node.as_str()).collect();
        assert!(from_c.is_empty());
        assert!(g.edge_between("b", "c").is_some());
        assert!(g.edge_between("c", "b").is_none());
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let err = NavGraph::from_parts(
            GraphSource::default(),
            vec![node("a", NodeKind::Room, 0.0, 0.0)],
            vec![Edge::new("a".into(), "ghost".into(), 1.0, EdgeKind::Hallway, true)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Invariant);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let err = NavGraph::from_parts(
            GraphSource::default(),
            vec![
                node("a", NodeKind::Room, 0.0, 0.0),
                node("a", NodeKind::Room, 1.0, 0.0),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Invariant);
    }

    #[test]
    fn test_components_and_stats() {
        let g = line_graph();
        let comps = g.connected_components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[1], vec![NodeId::from("z")]);
        assert!(g.same_component("a", "c"));
        assert!(!g.same_component("a", "z"));

        let stats = g.stats();
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.nodes_by_kind[&NodeKind::Room], 3);
        assert_eq!(stats.edges_by_kind[&EdgeKind::DoorRoom], 2);
        assert_eq!(stats.components, 2);
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let g = line_graph();
        let b = g.bounds().unwrap();
        assert_eq!(b.min, Point::new(0.0, 0.0));
        assert_eq!(b.max, Point::new(9.0, 9.0));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut n = node("room:R1@0,0", NodeKind::Room, 0.0, 0.0);
        assert_eq!(n.display_name(), "room:R1@0,0");
        n.source_id = Some("R1".into());
        assert_eq!(n.display_name(), "R1");
        n.label = Some("Library".into());
        assert_eq!(n.display_name(), "Library");
    }
}
