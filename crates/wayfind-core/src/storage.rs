//! Read/write primitive and graph files from disk.

use crate::graph::NavGraph;
use crate::primitive::PrimitiveSet;
use crate::schema;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const WAYFIND_DIR: &str = ".wayfind";
const GRAPH_FILE: &str = "graph.json";
const PRIMITIVES_FILE: &str = "primitives.json";
const META_FILE: &str = "meta.json";

/// Bookkeeping written next to the graph. Kept out of the graph itself so the
/// graph JSON stays byte-identical across rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub saved_at: DateTime<Utc>,
    pub fingerprint: String,
    pub nodes: usize,
    pub edges: usize,
}

/// Get the path to the wayfind directory for a given project root.
pub fn wayfind_dir(project_root: &Path) -> PathBuf {
    project_root.join(WAYFIND_DIR)
}

/// Get the path to the graph file for a given project root.
pub fn graph_file(project_root: &Path) -> PathBuf {
    wayfind_dir(project_root).join(GRAPH_FILE)
}

/// Get the path to the primitive file for a given project root.
pub fn primitives_file(project_root: &Path) -> PathBuf {
    wayfind_dir(project_root).join(PRIMITIVES_FILE)
}

/// Check if a built graph exists for the given project root.
pub fn graph_exists(project_root: &Path) -> bool {
    graph_file(project_root).exists()
}

/// Load a graph from disk.
pub fn load_graph(project_root: &Path) -> Result<NavGraph> {
    schema::from_json(&read_graph_file(project_root)?)
}

/// Load the graph without integrity checks, for commands that diagnose it.
pub fn load_graph_unchecked(project_root: &Path) -> Result<NavGraph> {
    schema::from_json_unchecked(&read_graph_file(project_root)?)
}

fn read_graph_file(project_root: &Path) -> Result<String> {
    let path = graph_file(project_root);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read graph from {}", path.display()))
}

/// Save a graph to disk, creating the .wayfind directory if needed.
pub fn save_graph(project_root: &Path, graph: &NavGraph) -> Result<()> {
    let dir = ensure_dir(project_root)?;

    let path = dir.join(GRAPH_FILE);
    let json = schema::to_json(graph)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write graph to {}", path.display()))?;

    let meta = StoreMeta {
        saved_at: Utc::now(),
        fingerprint: graph.source().fingerprint.clone(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
    };
    let meta_path = dir.join(META_FILE);
    fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("failed to write {}", meta_path.display()))?;

    Ok(())
}

/// Load the metadata of the last save, if any.
pub fn load_meta(project_root: &Path) -> Result<Option<StoreMeta>> {
    let path = wayfind_dir(project_root).join(META_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(serde_json::from_str(&json)?))
}

/// Read a primitive document from an arbitrary path.
pub fn read_primitives(path: &Path) -> Result<PrimitiveSet> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read primitives from {}", path.display()))?;
    PrimitiveSet::from_json(&json)
        .with_context(|| format!("invalid primitive file {}", path.display()))
}

/// Load the project's working primitive set.
pub fn load_primitives(project_root: &Path) -> Result<PrimitiveSet> {
    read_primitives(&primitives_file(project_root))
}

/// Save the project's working primitive set.
pub fn save_primitives(project_root: &Path, primitives: &PrimitiveSet) -> Result<()> {
    let dir = ensure_dir(project_root)?;
    let path = dir.join(PRIMITIVES_FILE);
    let json = primitives.to_json()?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write primitives to {}", path.display()))?;
    Ok(())
}

fn ensure_dir(project_root: &Path) -> Result<PathBuf> {
    let dir = wayfind_dir(project_root);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create wayfind directory {}", dir.display()))?;
    Ok(dir)
}
