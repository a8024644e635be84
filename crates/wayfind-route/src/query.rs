//! Resolve, route and describe in one call, returning plain serializable data.

use crate::directions::{Instruction, describe_with};
use crate::pathfind::{PathResult, SearchOptions, find_path_with};
use crate::resolve::{Candidate, MatchTier, ResolveOptions, resolve};
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::warn;
use wayfind_core::config::{DirectionConfig, NavConfig};
use wayfind_core::{NavGraph, NodeId};

/// Everything a route query needs besides the graph.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub resolve: ResolveOptions,
    /// Per-query search budget, measured from the start of the search.
    pub timeout: Option<Duration>,
    pub max_expansions: Option<usize>,
    pub diagnose_components: bool,
    pub directions: DirectionConfig,
}

impl From<&NavConfig> for RouteOptions {
    fn from(cfg: &NavConfig) -> Self {
        Self {
            resolve: ResolveOptions::from(&cfg.resolve),
            timeout: cfg.route.timeout_ms.map(Duration::from_millis),
            max_expansions: cfg.route.max_expansions,
            diagnose_components: cfg.route.diagnose_components,
            directions: cfg.directions.clone(),
        }
    }
}

/// Answer to one route query.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub from_query: String,
    pub to_query: String,
    /// Node chosen for `from_query`, if anything matched.
    pub from: Option<Candidate>,
    pub to: Option<Candidate>,
    pub result: PathResult,
    pub directions: Vec<Instruction>,
    pub message: String,
}

/// Route from `from` to `to`, each given as a node id or a place name.
///
/// A query that is an exact node id is used as is; anything else goes through the
/// resolver and its best candidate is taken.
pub fn route(graph: &NavGraph, from: &str, to: &str, opts: &RouteOptions) -> RouteResponse {
    let from_match = pick(graph, from, &opts.resolve);
    let to_match = pick(graph, to, &opts.resolve);

    let start = from_match
        .as_ref()
        .map_or_else(|| from.trim().to_string(), |c| c.node.to_string());
    let end = to_match
        .as_ref()
        .map_or_else(|| to.trim().to_string(), |c| c.node.to_string());

    let search = SearchOptions {
        deadline: opts.timeout.map(|t| Instant::now() + t),
        max_expansions: opts.max_expansions,
        diagnose_components: opts.diagnose_components,
    };
    let result = find_path_with(graph, &start, &end, &search);

    let directions = if result.success {
        describe_with(graph, &result.path, &opts.directions).unwrap_or_else(|e| {
            warn!(error = %e, "could not describe route");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    RouteResponse {
        from_query: from.to_string(),
        to_query: to.to_string(),
        from: from_match,
        to: to_match,
        message: result.message(),
        result,
        directions,
    }
}

/// Run independent route queries in parallel against one graph snapshot.
pub fn route_many(
    graph: &NavGraph,
    queries: &[(String, String)],
    opts: &RouteOptions,
) -> Vec<RouteResponse> {
    queries
        .par_iter()
        .map(|(from, to)| route(graph, from, to, opts))
        .collect()
}

fn pick(graph: &NavGraph, query: &str, opts: &ResolveOptions) -> Option<Candidate> {
    let query = query.trim();
    if let Some(node) = graph.node(query) {
        return Some(Candidate {
            node: NodeId::from(query),
            label: node.display_name().to_string(),
            kind: node.kind,
            score: 1.0,
            tier: MatchTier::Exact,
        });
    }
    resolve(graph, query, opts).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfind::FailureReason;
    use wayfind_core::graph::GraphSource;
    use wayfind_core::{Edge, EdgeKind, Node, NodeKind, Point};

    fn room(id: &str, label: &str, x: f64) -> Node {
        Node {
            id: NodeId::from(id),
            kind: NodeKind::Room,
            position: Point::new(x, 0.0),
            floor: None,
            source_id: None,
            label: Some(label.to_string()),
        }
    }

    fn graph() -> NavGraph {
        NavGraph::from_parts(
            GraphSource::default(),
            vec![room("r1", "Library", 0.0), room("r2", "Cafeteria", 4.0)],
            vec![Edge::new("r1".into(), "r2".into(), 4.0, EdgeKind::RoomFallback, true)],
        )
        .unwrap()
    }

    #[test]
    fn test_route_by_names() {
        let resp = route(&graph(), "library", "cafeteria", &RouteOptions::default());
        assert!(resp.result.success);
        assert_eq!(resp.result.length, 4.0);
        assert_eq!(resp.from.unwrap().node.as_str(), "r1");
        assert_eq!(resp.directions.len(), 2);
        assert_eq!(resp.directions[1].text, "Arrive at Cafeteria");
    }

    #[test]
    fn test_route_by_node_id() {
        let resp = route(&graph(), "r2", "r1", &RouteOptions::default());
        assert!(resp.result.success);
        assert_eq!(resp.from.unwrap().tier, MatchTier::Exact);
    }

    #[test]
    fn test_unknown_place_is_not_found() {
        let resp = route(&graph(), "library", "zzzz", &RouteOptions::default());
        assert!(!resp.result.success);
        assert!(resp.to.is_none());
        assert_eq!(resp.result.reason, Some(FailureReason::EndNotFound));
        assert!(resp.message.contains("zzzz"));
        assert!(resp.directions.is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let mut cfg = NavConfig::default();
        cfg.route.timeout_ms = Some(50);
        cfg.resolve.limit = 3;
        let opts = RouteOptions::from(&cfg);
        assert_eq!(opts.timeout, Some(Duration::from_millis(50)));
        assert_eq!(opts.resolve.limit, 3);
    }

    #[test]
    fn test_route_many_keeps_order() {
        let queries = vec![
            ("r1".to_string(), "r2".to_string()),
            ("r2".to_string(), "nowhere".to_string()),
        ];
        let out = route_many(&graph(), &queries, &RouteOptions::default());
        assert_eq!(out.len(), 2);
        assert!(out[0].result.success);
        assert!(!out[1].result.success);
    }
}
