//! Deterministic node identifiers.
//!
//! A node id is built from the node kind, the id of the primitive it came from and
//! its position quantized to a fixed grid, so rebuilding an unchanged primitive set
//! always yields the same ids and float formatting never leaks into an id.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a graph node, e.g. `room:R101@5000,5000` or
/// `stair:S1@2000,300/f2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Derive the id for a node of `kind` produced by primitive `source_id` at `position`.
    ///
    /// `quantum` is the grid size (in plan units) positions are snapped to.
    pub fn derive(
        kind: &str,
        source_id: &str,
        position: Point,
        floor: Option<i32>,
        quantum: f64,
    ) -> Self {
        let (qx, qy) = quantize(position, quantum);
        match floor {
            Some(f) => Self(format!("{kind}:{source_id}@{qx},{qy}/f{f}")),
            None => Self(format!("{kind}:{source_id}@{qx},{qy}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The node kind prefix (`room`, `door`, ...).
    pub fn kind_prefix(&self) -> &str {
        self.0.split_once(':').map_or("", |(k, _)| k)
    }
}

/// Snap a position onto the `quantum` grid.
pub fn quantize(position: Point, quantum: f64) -> (i64, i64) {
    let q = if quantum > 0.0 { quantum } else { 1.0 };
    ((position.x / q).round() as i64, (position.y / q).round() as i64)
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
