//! JSON schema validation and version handling for graph files.

use crate::graph::{GRAPH_VERSION, NavGraph};
use crate::integrity;
use anyhow::{Context, Result};

/// Validate a graph's schema version.
pub fn validate_version(graph: &NavGraph) -> Result<()> {
    if graph.version() != GRAPH_VERSION {
        anyhow::bail!(
            "graph version mismatch: expected {}, found {}",
            GRAPH_VERSION,
            graph.version()
        );
    }
    Ok(())
}

/// Serialize a graph to a pretty-printed JSON string.
pub fn to_json(graph: &NavGraph) -> Result<String> {
    serde_json::to_string_pretty(graph).context("failed to serialize graph to JSON")
}

/// Deserialize a graph from a JSON string, checking version and invariants.
pub fn from_json(json: &str) -> Result<NavGraph> {
    let graph = from_json_unchecked(json)?;
    integrity::ensure(&graph).context("graph file is corrupt")?;
    Ok(graph)
}

/// Deserialize a graph checking only its version. Callers that report
/// problems run `integrity::check` themselves; nothing else should route on it.
pub fn from_json_unchecked(json: &str) -> Result<NavGraph> {
    let graph: NavGraph =
        serde_json::from_str(json).context("failed to deserialize graph from JSON")?;
    validate_version(&graph)?;
    Ok(graph)
}
