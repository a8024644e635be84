//! Typed errors for graph construction and queries.

use crate::ids::NodeId;

pub type NavResult<T> = Result<T, NavError>;

/// Coarse classification of a [`NavError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedPrimitive,
    NodeNotFound,
    NoPathFound,
    DisconnectedGraph,
    TimedOut,
    Invariant,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("malformed primitive '{id}': {reason}")]
    MalformedPrimitive { id: String, reason: String },

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("no route from {start} to {end}")]
    NoPathFound { start: NodeId, end: NodeId },

    #[error("{start} and {end} are in disconnected parts of the graph")]
    DisconnectedGraph { start: NodeId, end: NodeId },

    #[error("route search timed out after expanding {expanded} nodes")]
    TimedOut { expanded: usize },

    /// Graph invariant violated. Always a builder bug, never bad input.
    #[error("graph invariant violated: {0}")]
    Invariant(String),
}

impl NavError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        NavError::MalformedPrimitive {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NavError::MalformedPrimitive { .. } => ErrorKind::MalformedPrimitive,
            NavError::NodeNotFound(_) => ErrorKind::NodeNotFound,
            NavError::NoPathFound { .. } => ErrorKind::NoPathFound,
            NavError::DisconnectedGraph { .. } => ErrorKind::DisconnectedGraph,
            NavError::TimedOut { .. } => ErrorKind::TimedOut,
            NavError::Invariant(_) => ErrorKind::Invariant,
        }
    }
}
