//! Structural checks over a built graph.

use crate::error::{NavError, NavResult};
use crate::graph::{NavGraph, NodeKind};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One violated graph invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    DanglingEdge { edge: String, missing: String },
    DuplicateEdgeId { edge: String },
    BadWeight { edge: String, weight: f64 },
    KeyMismatch { key: String, id: String },
    NonFinitePosition { node: String },
    DuplicateRoomNode { room: String, count: usize },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DanglingEdge { edge, missing } => {
                write!(f, "edge {} references missing node {}", edge, missing)
            }
            IntegrityIssue::DuplicateEdgeId { edge } => write!(f, "duplicate edge id {}", edge),
            IntegrityIssue::BadWeight { edge, weight } => {
                write!(f, "edge {} has invalid weight {}", edge, weight)
            }
            IntegrityIssue::KeyMismatch { key, id } => {
                write!(f, "node stored under {} carries id {}", key, id)
            }
            IntegrityIssue::NonFinitePosition { node } => {
                write!(f, "node {} has a non-finite position", node)
            }
            IntegrityIssue::DuplicateRoomNode { room, count } => {
                write!(f, "room {} has {} nodes (expected 1)", room, count)
            }
        }
    }
}

/// Collect every invariant violation in `graph`.
pub fn check(graph: &NavGraph) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for (key, node) in &graph.nodes {
        if key != &node.id {
            issues.push(IntegrityIssue::KeyMismatch {
                key: key.to_string(),
                id: node.id.to_string(),
            });
        }
        if !node.position.is_finite() {
            issues.push(IntegrityIssue::NonFinitePosition {
                node: node.id.to_string(),
            });
        }
    }

    let mut seen_edges: HashSet<&str> = HashSet::new();
    for edge in graph.edges() {
        for endpoint in [&edge.from, &edge.to] {
            if !graph.contains(endpoint.as_str()) {
                issues.push(IntegrityIssue::DanglingEdge {
                    edge: edge.id.clone(),
                    missing: endpoint.to_string(),
                });
            }
        }
        if !seen_edges.insert(edge.id.as_str()) {
            issues.push(IntegrityIssue::DuplicateEdgeId {
                edge: edge.id.clone(),
            });
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            issues.push(IntegrityIssue::BadWeight {
                edge: edge.id.clone(),
                weight: edge.weight,
            });
        }
    }

    let mut rooms: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        if node.kind == NodeKind::Room
            && let Some(src) = node.source_id.as_deref()
        {
            *rooms.entry(src).or_insert(0) += 1;
        }
    }
    let mut duplicated: Vec<(&str, usize)> = rooms.into_iter().filter(|(_, c)| *c > 1).collect();
    duplicated.sort_unstable();
    for (room, count) in duplicated {
        issues.push(IntegrityIssue::DuplicateRoomNode {
            room: room.to_string(),
            count,
        });
    }

    issues
}

/// Fail with [`NavError::Invariant`] on the first violation.
pub fn ensure(graph: &NavGraph) -> NavResult<()> {
    match check(graph).into_iter().next() {
        Some(issue) => Err(NavError::Invariant(issue.to_string())),
        None => Ok(()),
    }
}
