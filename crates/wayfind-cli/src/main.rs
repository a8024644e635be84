//! CLI binary for wayfind: build navigation graphs from floor-plan primitives and route through them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wayfind_build::{Edit, apply_edits, build, diff_graphs, rebuild, validate::check_primitives};
use wayfind_core::config::NavConfig;
use wayfind_core::{NavGraph, Primitive, PrimitiveSet, integrity, storage};
use wayfind_route::export::{ExportFormat, export};
use wayfind_route::{ResolveOptions, RouteOptions, resolve, route};

#[derive(Parser)]
#[command(name = "wayfind", about = "Indoor navigation graph engine")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the navigation graph from a primitive file
    Build {
        /// Primitive JSON to import (defaults to .wayfind/primitives.json)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Rebuild even if the primitives are unchanged
        #[arg(long)]
        force: bool,
    },

    /// Show graph statistics
    Info,

    /// Find nodes matching a place name
    Resolve {
        /// Place name, e.g. "cse library"
        query: String,

        /// Maximum number of candidates
        #[arg(short, long)]
        limit: Option<usize>,

        /// Also match bare hallway waypoints
        #[arg(long)]
        waypoints: bool,
    },

    /// Route between two places (node ids or names)
    Route {
        from: String,
        to: String,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Report disconnected endpoints before searching
        #[arg(long)]
        diagnose: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add or replace primitives from a JSON file (one primitive or an array)
    Add {
        file: PathBuf,
    },

    /// Remove primitives by id
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show what a rebuild would change without saving (dry-run)
    Diff {
        /// Primitive JSON to compare against (defaults to .wayfind/primitives.json)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Export graph as DOT (Graphviz) or Mermaid flowchart
    Export {
        /// Output format: dot, mermaid
        #[arg(short, long, default_value = "dot")]
        format: String,
    },

    /// Validate primitives and graph integrity
    Validate,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = NavConfig::load(&project_root)?;

    match cli.command {
        Commands::Build { input, force } => cmd_build(&project_root, &config, input, force),
        Commands::Info => cmd_info(&project_root),
        Commands::Resolve {
            query,
            limit,
            waypoints,
        } => cmd_resolve(&project_root, &config, &query, limit, waypoints),
        Commands::Route {
            from,
            to,
            timeout_ms,
            diagnose,
            json,
        } => cmd_route(
            &project_root,
            &config,
            &from,
            &to,
            timeout_ms,
            diagnose,
            json,
        ),
        Commands::Add { file } => cmd_add(&project_root, &config, &file),
        Commands::Remove { ids } => cmd_remove(&project_root, &config, ids),
        Commands::Diff { input } => cmd_diff(&project_root, &config, input),
        Commands::Export { format } => cmd_export(&project_root, &format),
        Commands::Validate => cmd_validate(&project_root),
    }
}

fn require_graph(project_root: &Path) -> Result<NavGraph> {
    if !storage::graph_exists(project_root) {
        anyhow::bail!("No graph found. Run `wayfind build` first.");
    }
    storage::load_graph(project_root)
}

fn cmd_build(
    project_root: &Path,
    config: &NavConfig,
    input: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let primitives = match &input {
        Some(path) => storage::read_primitives(path)?,
        None => storage::load_primitives(project_root).context(
            "no primitives to build from; pass --input or add primitives with `wayfind add`",
        )?,
    };

    if !force && storage::graph_exists(project_root) {
        let old = storage::load_graph(project_root)?;
        let result = rebuild(&old, &primitives, &config.build)?;
        if result.cached {
            eprintln!("Graph is up to date ({} nodes, {} edges).", old.node_count(), old.edge_count());
            return Ok(());
        }
        storage::save_primitives(project_root, &primitives)?;
        storage::save_graph(project_root, &result.graph)?;
        eprintln!("Rebuilt graph: {}", result.diff.summary());
        return Ok(());
    }

    let graph = build(&primitives, &config.build)?;
    storage::save_primitives(project_root, &primitives)?;
    storage::save_graph(project_root, &graph)?;

    eprintln!(
        "Built graph for '{}': {} nodes, {} edges from {} primitives",
        primitives.plan_id,
        graph.node_count(),
        graph.edge_count(),
        primitives.len()
    );
    eprintln!("Saved to {}", storage::graph_file(project_root).display());
    Ok(())
}

fn cmd_info(project_root: &Path) -> Result<()> {
    if !storage::graph_exists(project_root) {
        eprintln!("No graph found. Run `wayfind build` first.");
        return Ok(());
    }

    let graph = storage::load_graph(project_root)?;
    let stats = graph.stats();

    println!("Graph v{}", graph.version());
    println!("Plan: {}", graph.source().plan_id);
    if !graph.source().fingerprint.is_empty() {
        let fp = &graph.source().fingerprint;
        println!("Fingerprint: {}", &fp[..12.min(fp.len())]);
    }
    if let Some(meta) = storage::load_meta(project_root)? {
        println!("Saved: {}", meta.saved_at);
    }
    println!();
    println!("Nodes: {}", stats.total_nodes);
    for (kind, count) in &stats.nodes_by_kind {
        println!("  {}: {}", kind, count);
    }
    println!("Edges: {}", stats.total_edges);
    for (kind, count) in &stats.edges_by_kind {
        println!("  {}: {}", kind, count);
    }
    if !stats.floors.is_empty() {
        let floors: Vec<String> = stats.floors.iter().map(|f| f.to_string()).collect();
        println!("Floors: {}", floors.join(", "));
    }
    println!("Components: {}", stats.components);
    if let Some(b) = graph.bounds() {
        println!(
            "Bounds: ({}, {}) - ({}, {})",
            b.min.x, b.min.y, b.max.x, b.max.y
        );
    }

    Ok(())
}

fn cmd_resolve(
    project_root: &Path,
    config: &NavConfig,
    query: &str,
    limit: Option<usize>,
    waypoints: bool,
) -> Result<()> {
    let graph = require_graph(project_root)?;
    let mut opts = ResolveOptions::from(&config.resolve);
    if let Some(limit) = limit {
        opts.limit = limit;
    }
    opts.include_waypoints |= waypoints;

    let candidates = resolve(&graph, query, &opts);
    if candidates.is_empty() {
        eprintln!("No places match '{}'.", query);
        return Ok(());
    }
    for c in &candidates {
        println!(
            "{:.3}  {:<9} {}  [{}]",
            c.score,
            format!("{:?}", c.tier).to_lowercase(),
            c.label,
            c.node
        );
    }
    Ok(())
}

fn cmd_route(
    project_root: &Path,
    config: &NavConfig,
    from: &str,
    to: &str,
    timeout_ms: Option<u64>,
    diagnose: bool,
    json: bool,
) -> Result<()> {
    let graph = require_graph(project_root)?;
    let mut opts = RouteOptions::from(config);
    if let Some(ms) = timeout_ms {
        opts.timeout = Some(Duration::from_millis(ms));
    }
    opts.diagnose_components |= diagnose;

    let resp = route(&graph, from, to, &opts);

    if json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    if !resp.result.success {
        anyhow::bail!("{}", resp.message);
    }

    println!(
        "Route: {} steps, length {:.1} ({} nodes expanded)",
        resp.result.steps, resp.result.length, resp.result.expanded
    );
    for ins in &resp.directions {
        if ins.distance > 0.0 {
            println!("{:>3}. {}  ({:.1})", ins.step, ins.text, ins.distance);
        } else {
            println!("{:>3}. {}", ins.step, ins.text);
        }
    }
    Ok(())
}

/// Parse a JSON file holding either one primitive or an array of them.
fn read_primitive_list(path: &Path) -> Result<Vec<Primitive>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let list = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|p| vec![p])
    };
    list.with_context(|| format!("{} does not contain room, door or hallway records", path.display()))
}

fn cmd_add(project_root: &Path, config: &NavConfig, file: &Path) -> Result<()> {
    let additions = read_primitive_list(file)?;
    let edits = additions.into_iter().map(Edit::Upsert);
    apply_and_rebuild(project_root, config, edits)
}

fn cmd_remove(project_root: &Path, config: &NavConfig, ids: Vec<String>) -> Result<()> {
    let edits = ids.into_iter().map(Edit::Remove);
    apply_and_rebuild(project_root, config, edits)
}

fn apply_and_rebuild(
    project_root: &Path,
    config: &NavConfig,
    edits: impl IntoIterator<Item = Edit>,
) -> Result<()> {
    let current = if storage::primitives_file(project_root).exists() {
        storage::load_primitives(project_root)?
    } else {
        PrimitiveSet::new("plan")
    };
    let (primitives, summary) = apply_edits(&current, edits)?;
    let graph = if storage::graph_exists(project_root) {
        let old = storage::load_graph(project_root)?;
        let result = rebuild(&old, &primitives, &config.build)?;
        eprintln!("Graph changes: {}", result.diff.summary());
        result.graph
    } else {
        build(&primitives, &config.build)?
    };

    storage::save_primitives(project_root, &primitives)?;
    storage::save_graph(project_root, &graph)?;
    eprintln!(
        "Primitives: {} added, {} replaced, {} removed ({} total)",
        summary.added,
        summary.replaced,
        summary.removed,
        primitives.len()
    );
    Ok(())
}

fn cmd_diff(project_root: &Path, config: &NavConfig, input: Option<PathBuf>) -> Result<()> {
    let old = require_graph(project_root)?;
    let primitives = match &input {
        Some(path) => storage::read_primitives(path)?,
        None => storage::load_primitives(project_root)?,
    };
    let new = build(&primitives, &config.build)?;
    let diff = diff_graphs(&old, &new);

    if diff.is_empty() {
        eprintln!("No changes.");
        return Ok(());
    }

    println!("{}", diff.summary());
    for id in &diff.added_nodes {
        println!("  + {}", id);
    }
    for id in &diff.removed_nodes {
        println!("  - {}", id);
    }
    for id in &diff.changed_nodes {
        println!("  ~ {}", id);
    }
    for id in &diff.added_edges {
        println!("  + {}", id);
    }
    for id in &diff.removed_edges {
        println!("  - {}", id);
    }
    for id in &diff.reweighted_edges {
        println!("  ~ {}", id);
    }
    Ok(())
}

fn cmd_export(project_root: &Path, format: &str) -> Result<()> {
    let graph = require_graph(project_root)?;

    let export_format = match format {
        "dot" | "graphviz" => ExportFormat::Dot,
        "mermaid" | "md" => ExportFormat::Mermaid,
        _ => anyhow::bail!("Unknown export format: {}. Use 'dot' or 'mermaid'.", format),
    };

    print!("{}", export(&graph, export_format));
    Ok(())
}

fn cmd_validate(project_root: &Path) -> Result<()> {
    let mut issues = 0;

    if storage::primitives_file(project_root).exists() {
        let primitives = storage::load_primitives(project_root)?;
        for err in check_primitives(&primitives) {
            println!("WARN: {}", err);
            issues += 1;
        }
    }

    if !storage::graph_exists(project_root) {
        anyhow::bail!("No graph found. Run `wayfind build` first.");
    }
    // Corrupt graphs must still load here so every issue gets listed.
    let graph = storage::load_graph_unchecked(project_root)?;
    for issue in integrity::check(&graph) {
        println!("WARN: {}", issue);
        issues += 1;
    }

    let stats = graph.stats();
    if stats.components > 1 {
        println!(
            "NOTE: graph has {} disconnected parts; some places cannot reach each other",
            stats.components
        );
    }

    if issues == 0 {
        eprintln!("Graph is valid. No integrity issues found.");
        eprintln!(
            "  {} nodes, {} edges, {} floors",
            stats.total_nodes,
            stats.total_edges,
            stats.floors.len()
        );
    } else {
        eprintln!("\nFound {} integrity issue(s).", issues);
    }

    Ok(())
}
