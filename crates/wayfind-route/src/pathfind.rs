//! A* shortest routes over a [`NavGraph`].
//!
//! The heuristic is the straight-line distance to the goal. It is admissible as
//! long as no edge is shorter than the straight line between its endpoints, which
//! the builder guarantees (floor-change edges included). Nodes whose cost improves
//! after expansion are reopened, so the result stays optimal for any admissible
//! heuristic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wayfind_core::config::RouteConfig;
use wayfind_core::{NavError, NavGraph, NavResult, Node, NodeId};

/// Why a route could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    NoPath,
    StartNotFound,
    EndNotFound,
    DisconnectedGraph,
}

/// Refinement of [`FailureReason::NoPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubReason {
    TimedOut,
}

/// Outcome of a route search. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub success: bool,
    /// Node ids from start to end. Empty on failure.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<NodeId>,
    /// Sum of edge weights along `path`.
    pub length: f64,
    /// Edges traversed.
    pub steps: usize,
    /// Nodes expanded by the search.
    pub expanded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_reason: Option<SubReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NodeId>,
    /// The requested id that does not exist, for the *_NOT_FOUND reasons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

impl PathResult {
    fn found(path: Vec<NodeId>, length: f64, expanded: usize) -> Self {
        Self {
            success: true,
            steps: path.len().saturating_sub(1),
            start: path.first().cloned(),
            end: path.last().cloned(),
            path,
            length,
            expanded,
            reason: None,
            sub_reason: None,
            missing: None,
        }
    }

    fn failed(reason: FailureReason, start: Option<NodeId>, end: Option<NodeId>) -> Self {
        Self {
            success: false,
            path: Vec::new(),
            length: 0.0,
            steps: 0,
            expanded: 0,
            reason: Some(reason),
            sub_reason: None,
            start,
            end,
            missing: None,
        }
    }

    fn not_found(reason: FailureReason, missing: &str, start: Option<NodeId>) -> Self {
        Self {
            missing: Some(missing.to_string()),
            ..Self::failed(reason, start, None)
        }
    }

    /// A sentence telling the user what went wrong and what to do about it.
    pub fn message(&self) -> String {
        let name = |id: &Option<NodeId>| id.as_ref().map_or("?", |n| n.as_str()).to_string();
        let missing = self.missing.as_deref().unwrap_or("?");
        match (self.reason, self.sub_reason) {
            (None, _) => format!(
                "route found: {} steps, length {:.1}",
                self.steps, self.length
            ),
            (Some(FailureReason::StartNotFound), _) => format!(
                "unknown start location '{}'; check the name or pick one of the suggested places",
                missing
            ),
            (Some(FailureReason::EndNotFound), _) => format!(
                "unknown destination '{}'; check the name or pick one of the suggested places",
                missing
            ),
            (Some(FailureReason::DisconnectedGraph), _) => format!(
                "{} and {} are in separate parts of the plan; add the door or hallway that joins them",
                name(&self.start),
                name(&self.end)
            ),
            (Some(FailureReason::NoPath), Some(SubReason::TimedOut)) => format!(
                "route search gave up after expanding {} nodes; retry with a larger timeout",
                self.expanded
            ),
            (Some(FailureReason::NoPath), None) => format!(
                "no walkable route from {} to {}; a one-way door or a missing connection blocks it",
                name(&self.start),
                name(&self.end)
            ),
        }
    }

    /// The failure as a [`NavError`], or `None` on success.
    pub fn to_error(&self) -> Option<NavError> {
        let start = || self.start.clone().unwrap_or_else(|| NodeId::from("?"));
        let end = || self.end.clone().unwrap_or_else(|| NodeId::from("?"));
        let missing = || NodeId::from(self.missing.clone().unwrap_or_default());
        Some(match (self.reason?, self.sub_reason) {
            (FailureReason::StartNotFound | FailureReason::EndNotFound, _) => {
                NavError::NodeNotFound(missing())
            }
            (FailureReason::DisconnectedGraph, _) => NavError::DisconnectedGraph {
                start: start(),
                end: end(),
            },
            (FailureReason::NoPath, Some(SubReason::TimedOut)) => NavError::TimedOut {
                expanded: self.expanded,
            },
            (FailureReason::NoPath, None) => NavError::NoPathFound {
                start: start(),
                end: end(),
            },
        })
    }
}

/// Limits and diagnostics for one search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Abort once this instant has passed.
    pub deadline: Option<Instant>,
    /// Abort after this many expansions.
    pub max_expansions: Option<usize>,
    /// Report DISCONNECTED_GRAPH when the endpoints share no component.
    pub diagnose_components: bool,
}

impl SearchOptions {
    /// Options for a search starting now under `cfg`.
    pub fn from_config(cfg: &RouteConfig) -> Self {
        Self {
            deadline: cfg
                .timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            max_expansions: cfg.max_expansions,
            diagnose_components: cfg.diagnose_components,
        }
    }
}

/// Lifecycle of an [`AStar`] search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchState {
    Unstarted,
    Expanding,
    Found,
    Exhausted,
}

/// Frontier entry. Max-heap order: lowest f first, then earliest discovery.
#[derive(Debug)]
struct Frontier<'g> {
    f: f64,
    g: f64,
    seq: u64,
    node: &'g str,
}

impl PartialEq for Frontier<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier<'_> {}

impl PartialOrd for Frontier<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A single A* search, advanced one expansion at a time with [`AStar::step`].
pub struct AStar<'g> {
    graph: &'g NavGraph,
    start: &'g Node,
    goal: &'g Node,
    state: SearchState,
    open: BinaryHeap<Frontier<'g>>,
    best_g: HashMap<&'g str, f64>,
    came_from: HashMap<&'g str, &'g str>,
    seq: u64,
    expanded: usize,
}

impl<'g> AStar<'g> {
    pub fn new(graph: &'g NavGraph, start: &str, goal: &str) -> NavResult<Self> {
        let start = graph
            .node(start)
            .ok_or_else(|| NavError::NodeNotFound(NodeId::from(start)))?;
        let goal = graph
            .node(goal)
            .ok_or_else(|| NavError::NodeNotFound(NodeId::from(goal)))?;
        Ok(Self {
            graph,
            start,
            goal,
            state: SearchState::Unstarted,
            open: BinaryHeap::new(),
            best_g: HashMap::new(),
            came_from: HashMap::new(),
            seq: 0,
            expanded: 0,
        })
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }

    fn heuristic(&self, node: &Node) -> f64 {
        node.position.distance(self.goal.position)
    }

    fn push(&mut self, node: &'g Node, g: f64) {
        let f = g + self.heuristic(node);
        self.open.push(Frontier {
            f,
            g,
            seq: self.seq,
            node: node.id.as_str(),
        });
        self.seq += 1;
    }

    /// Advance the search by one frontier pop and return the new state.
    pub fn step(&mut self) -> SearchState {
        match self.state {
            SearchState::Unstarted => {
                self.best_g.insert(self.start.id.as_str(), 0.0);
                self.push(self.start, 0.0);
                self.state = SearchState::Expanding;
            }
            SearchState::Expanding => self.expand_next(),
            SearchState::Found | SearchState::Exhausted => {}
        }
        self.state
    }

    fn expand_next(&mut self) {
        let Some(entry) = self.open.pop() else {
            self.state = SearchState::Exhausted;
            return;
        };
        // Stale entry: a cheaper route to this node was pushed later.
        if self
            .best_g
            .get(entry.node)
            .is_some_and(|&best| entry.g > best)
        {
            return;
        }
        if entry.node == self.goal.id.as_str() {
            self.state = SearchState::Found;
            return;
        }

        self.expanded += 1;
        let graph = self.graph;
        for neighbor in graph.neighbors(entry.node) {
            let Some(next) = graph.node(neighbor.node.as_str()) else {
                continue;
            };
            let tentative = entry.g + neighbor.weight;
            let key = next.id.as_str();
            if self.best_g.get(key).is_none_or(|&g| tentative < g) {
                self.best_g.insert(key, tentative);
                self.came_from.insert(key, entry.node);
                self.push(next, tentative);
            }
        }
    }

    /// Run until the search is found or exhausted.
    pub fn run(&mut self) -> SearchState {
        loop {
            match self.step() {
                SearchState::Found | SearchState::Exhausted => return self.state,
                SearchState::Unstarted | SearchState::Expanding => {}
            }
        }
    }

    /// The route from start to goal, once [`SearchState::Found`].
    pub fn path(&self) -> Option<Vec<NodeId>> {
        if self.state != SearchState::Found {
            return None;
        }
        let mut path = vec![self.goal.id.clone()];
        let mut current = self.goal.id.as_str();
        while current != self.start.id.as_str() {
            current = *self.came_from.get(current)?;
            path.push(NodeId::from(current));
        }
        path.reverse();
        Some(path)
    }

    /// Cost of the best known route to the goal.
    pub fn cost(&self) -> Option<f64> {
        self.best_g.get(self.goal.id.as_str()).copied()
    }
}

/// Find the shortest route from `start` to `end` with no limits.
pub fn find_path(graph: &NavGraph, start: &str, end: &str) -> PathResult {
    find_path_with(graph, start, end, &SearchOptions::default())
}

/// Find the shortest route from `start` to `end` under `opts`.
pub fn find_path_with(
    graph: &NavGraph,
    start: &str,
    end: &str,
    opts: &SearchOptions,
) -> PathResult {
    if !graph.contains(start) {
        return PathResult::not_found(FailureReason::StartNotFound, start, None);
    }
    if !graph.contains(end) {
        return PathResult::not_found(FailureReason::EndNotFound, end, Some(NodeId::from(start)));
    }
    let (start_id, end_id) = (NodeId::from(start), NodeId::from(end));

    if opts.diagnose_components && start != end && !graph.same_component(start, end) {
        debug!(%start, %end, "endpoints lie in different components");
        return PathResult::failed(
            FailureReason::DisconnectedGraph,
            Some(start_id),
            Some(end_id),
        );
    }

    let mut search = match AStar::new(graph, start, end) {
        Ok(search) => search,
        Err(_) => {
            return PathResult::failed(FailureReason::NoPath, Some(start_id), Some(end_id));
        }
    };

    loop {
        match search.step() {
            SearchState::Found => break,
            SearchState::Exhausted => {
                debug!(%start, %end, expanded = search.expanded(), "search exhausted");
                return PathResult {
                    expanded: search.expanded(),
                    ..PathResult::failed(FailureReason::NoPath, Some(start_id), Some(end_id))
                };
            }
            SearchState::Unstarted | SearchState::Expanding => {}
        }

        let over_budget = opts.max_expansions.is_some_and(|max| search.expanded() >= max);
        let past_deadline = opts.deadline.is_some_and(|d| Instant::now() >= d);
        if over_budget || past_deadline {
            warn!(%start, %end, expanded = search.expanded(), "route search timed out");
            return PathResult {
                expanded: search.expanded(),
                sub_reason: Some(SubReason::TimedOut),
                ..PathResult::failed(FailureReason::NoPath, Some(start_id), Some(end_id))
            };
        }
    }

    match (search.path(), search.cost()) {
        (Some(path), Some(cost)) => {
            debug!(%start, %end, steps = path.len() - 1, length = cost, "route found");
            PathResult::found(path, cost, search.expanded())
        }
        _ => PathResult::failed(FailureReason::NoPath, Some(start_id), Some(end_id)),
    }
}
