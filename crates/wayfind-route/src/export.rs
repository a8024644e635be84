//! Export a navigation graph as DOT (Graphviz) or Mermaid flowchart.

use std::fmt::Write;
use wayfind_core::{EdgeKind, NavGraph, NodeKind};

/// Export format for graph visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dot,
    Mermaid,
}

fn node_shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Room => "box",
        NodeKind::Door => "diamond",
        NodeKind::Exit => "doubleoctagon",
        NodeKind::Waypoint => "point",
        NodeKind::Stair => "trapezium",
        NodeKind::Lift => "box3d",
    }
}

fn edge_style(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::DoorRoom | EdgeKind::DoorHallway => "solid",
        EdgeKind::Hallway => "bold",
        EdgeKind::RoomFallback => "dashed",
        EdgeKind::FloorChange => "dotted",
    }
}

/// Export the graph as a DOT string. Node positions are pinned (`pos="x,y!"`), so
/// `neato -n` draws the plan to scale.
pub fn export_dot(graph: &NavGraph) -> String {
    let mut out = String::new();
    writeln!(out, "graph \"{}\" {{", escape(&graph.source().plan_id)).unwrap();
    writeln!(out, "  node [fontsize=10];").unwrap();
    writeln!(out).unwrap();

    for node in graph.nodes() {
        writeln!(
            out,
            "  \"{}\" [shape={}, label=\"{}\", pos=\"{},{}!\"];",
            escape(node.id.as_str()),
            node_shape(node.kind),
            escape(node.display_name()),
            node.position.x,
            node.position.y,
        )
        .unwrap();
    }

    writeln!(out).unwrap();

    for edge in graph.edges() {
        let dir = if edge.bidirectional { "none" } else { "forward" };
        writeln!(
            out,
            "  \"{}\" -- \"{}\" [style={}, dir={}, label=\"{} {:.1}\"];",
            escape(edge.from.as_str()),
            escape(edge.to.as_str()),
            edge_style(edge.kind),
            dir,
            edge.kind,
            edge.weight,
        )
        .unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

/// Export the graph as a Mermaid flowchart string, one subgraph per floor.
pub fn export_mermaid(graph: &NavGraph) -> String {
    let mut out = String::new();
    writeln!(out, "flowchart LR").unwrap();

    let stats = graph.stats();
    let mut floors: Vec<Option<i32>> = stats.floors.iter().copied().map(Some).collect();
    floors.push(None);

    for floor in floors {
        let members: Vec<_> = graph.nodes().filter(|n| n.floor == floor).collect();
        if members.is_empty() {
            continue;
        }
        let pad = if let Some(f) = floor {
            writeln!(out, "  subgraph floor_{}[\"Floor {}\"]", f, f).unwrap();
            "    "
        } else {
            "  "
        };
        for node in members {
            writeln!(
                out,
                "{}{}[\"{}\\n({})\"]",
                pad,
                mermaid_safe_id(node.id.as_str()),
                node.display_name().replace('"', "'"),
                node.kind
            )
            .unwrap();
        }
        if floor.is_some() {
            writeln!(out, "  end").unwrap();
        }
    }

    writeln!(out).unwrap();

    for edge in graph.edges() {
        let arrow = match (edge.kind, edge.bidirectional) {
            (_, false) => "-->",
            (EdgeKind::RoomFallback, true) => "-.-",
            (EdgeKind::FloorChange, true) => "===",
            _ => "---",
        };
        writeln!(
            out,
            "  {} {}|{}| {}",
            mermaid_safe_id(edge.from.as_str()),
            arrow,
            edge.kind,
            mermaid_safe_id(edge.to.as_str())
        )
        .unwrap();
    }

    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Make an ID safe for Mermaid (replace special characters).
fn mermaid_safe_id(id: &str) -> String {
    id.replace([':', '/', '.', ' ', '-', '@', ','], "_")
}

/// Export the graph in the specified format.
pub fn export(graph: &NavGraph, format: ExportFormat) -> String {
    match format {
        ExportFormat::Dot => export_dot(graph),
        ExportFormat::Mermaid => export_mermaid(graph),
    }
}
